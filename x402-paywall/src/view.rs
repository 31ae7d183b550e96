//! Presentation-neutral view model of the paywall gate.
//!
//! [`GateView::build`] turns the paywall's inputs (theme, overrides, flow
//! snapshot, wallet and balance) into everything a presentation layer needs
//! to draw the gate, with no rendering technology assumed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::flow::{FlowSnapshot, PaymentStatus};
use crate::networks::Network;
use crate::theme::{self, ThemeConfig, ThemePreset, button_label, format_usd, join_classes};

/// Heading of the gate.
pub const GATE_TITLE: &str = "Payment Required";

/// Line shown next to the shield icon.
pub const SECURITY_MESSAGE: &str = "Secure payment powered by Solana";

/// Lead-in of the helper line below the button.
pub const HELPER_TEXT: &str = "Don't have USDC?";

/// Text of the helper link.
pub const HELPER_LINK_TEXT: &str = "Get it here";

/// Currency shown in the payment details.
pub const CURRENCY: &str = "USDC";

/// Optional caller-supplied additions per visual slot.
///
/// Used both for extra classes ([`ClassOverrides`]) and for inline styles
/// ([`StyleOverrides`]); values are appended after the theme's own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlotOverrides {
    /// Full-page container.
    pub container: Option<String>,
    /// Card surface.
    pub card: Option<String>,
    /// Card title.
    pub title: Option<String>,
    /// Pay button.
    pub button: Option<String>,
    /// Status banner.
    pub status: Option<String>,
    /// Payment-details panel.
    pub payment_details: Option<String>,
    /// Connected-wallet panel.
    pub wallet_section: Option<String>,
}

/// Extra classes per slot.
pub type ClassOverrides = SlotOverrides;

/// Inline styles per slot.
pub type StyleOverrides = SlotOverrides;

/// Which optional gate sections are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Show the wallet's USDC balance.
    pub show_balance: bool,
    /// Show the network row and badge.
    pub show_network_info: bool,
    /// Show the payment-details panel.
    pub show_payment_details: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_balance: true,
            show_network_info: true,
            show_payment_details: true,
        }
    }
}

/// Resolved classes for every slot of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateClasses {
    /// Full-page container.
    pub container: String,
    /// Card surface.
    pub card: String,
    /// Brand icon badge.
    pub icon: String,
    /// Card title.
    pub title: String,
    /// Description under the title.
    pub subtitle: String,
    /// Pay button.
    pub button: String,
    /// Payment-details panel.
    pub payment_details: String,
    /// Notice banner.
    pub notice: String,
    /// Connected-wallet panel.
    pub wallet_section: String,
    /// Status banner.
    pub status: String,
    /// Security message line.
    pub security_message: String,
    /// Helper line below the button.
    pub helper_text: String,
    /// Link inside the helper line.
    pub helper_link: String,
}

impl GateClasses {
    fn resolve(theme: &ThemeConfig, overrides: &ClassOverrides) -> Self {
        let with = |base: &str, extra: &Option<String>| {
            join_classes([base, extra.as_deref().unwrap_or_default()])
        };
        Self {
            container: with(theme.container, &overrides.container),
            card: with(theme.card, &overrides.card),
            icon: theme.icon.to_owned(),
            title: with(theme.title, &overrides.title),
            subtitle: theme.subtitle.to_owned(),
            button: join_classes([
                "w-full h-12",
                theme.button,
                overrides.button.as_deref().unwrap_or_default(),
            ]),
            payment_details: with(theme.payment_details, &overrides.payment_details),
            notice: theme.notice.to_owned(),
            wallet_section: with(theme.wallet_section, &overrides.wallet_section),
            status: with(theme.status_accent, &overrides.status),
            security_message: theme.security_message.to_owned(),
            helper_text: theme.helper_text.to_owned(),
            helper_link: theme.helper_link.to_owned(),
        }
    }
}

/// Inline backgrounds of the container and card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backgrounds {
    /// Container background.
    pub container: &'static str,
    /// Card background.
    pub card: &'static str,
}

/// Summary of the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    /// Full address.
    pub address: String,
    /// Shortened address, e.g. `7xKX...gAsU`.
    pub short_address: String,
    /// Two uppercase characters for the avatar.
    pub initials: String,
    /// `Mainnet` or `Devnet`.
    pub network_label: Option<&'static str>,
    /// Balance with two decimals, when shown.
    pub balance: Option<String>,
}

/// One row of the payment-details panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    /// Row label.
    pub label: &'static str,
    /// Formatted value.
    pub value: String,
}

/// Status banner shown while not idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBanner {
    /// Status shown.
    pub status: PaymentStatus,
    /// Banner text.
    pub message: String,
}

/// The pay button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    /// Button text.
    pub label: String,
    /// Shows a spinner.
    pub loading: bool,
    /// Rejects clicks.
    pub disabled: bool,
}

/// Everything needed to draw the gate in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateView {
    /// Active preset.
    pub preset: ThemePreset,
    /// Whether the card is dark.
    pub dark: bool,
    /// Classes per slot.
    pub classes: GateClasses,
    /// Inline backgrounds.
    pub backgrounds: Backgrounds,
    /// Caller inline styles per slot.
    pub styles: StyleOverrides,
    /// Heading.
    pub title: &'static str,
    /// What is being paid for.
    pub description: String,
    /// Connected wallet, if any.
    pub wallet: Option<WalletSummary>,
    /// Payment-details rows, when shown.
    pub details: Option<Vec<DetailRow>>,
    /// Status banner, when not idle.
    pub status: Option<StatusBanner>,
    /// The pay button.
    pub button: ButtonView,
    /// Inline error message.
    pub error: Option<String>,
    /// Security message.
    pub security_message: &'static str,
    /// Helper line lead-in.
    pub helper_text: &'static str,
    /// Helper link text.
    pub helper_link_text: &'static str,
}

/// Inputs of [`GateView::build`].
#[derive(Debug, Clone, Copy)]
pub struct GateInput<'a> {
    /// Theme preset.
    pub preset: ThemePreset,
    /// Extra classes.
    pub classes: &'a ClassOverrides,
    /// Extra inline styles.
    pub styles: &'a StyleOverrides,
    /// Visible sections.
    pub options: DisplayOptions,
    /// Price in USDC.
    pub amount: Decimal,
    /// What is being paid for.
    pub description: &'a str,
    /// Payment network.
    pub network: Network,
    /// Connected wallet address.
    pub address: Option<&'a str>,
    /// Formatted balance.
    pub balance: &'a str,
    /// Current flow state.
    pub snapshot: &'a FlowSnapshot,
}

impl GateView {
    /// Builds the view for the given inputs.
    #[must_use]
    pub fn build(input: &GateInput<'_>) -> Self {
        let theme = theme::resolve(input.preset);
        let snapshot = input.snapshot;
        let options = input.options;
        let loading = snapshot.is_loading();

        let wallet = input.address.map(|address| WalletSummary {
            address: address.to_owned(),
            short_address: shorten_address(address),
            initials: avatar_initials(address),
            network_label: options.show_network_info.then(|| input.network.label()),
            balance: options.show_balance.then(|| input.balance.to_owned()),
        });

        let details = options
            .show_payment_details
            .then(|| detail_rows(input, wallet.as_ref()));

        let status = (snapshot.status != PaymentStatus::Idle)
            .then(|| theme::status_message(snapshot.status, snapshot.error.as_ref()))
            .flatten()
            .map(|message| StatusBanner {
                status: snapshot.status,
                message,
            });

        Self {
            preset: input.preset,
            dark: input.preset.is_dark(),
            classes: GateClasses::resolve(theme, input.classes),
            backgrounds: Backgrounds {
                container: theme.container_background,
                card: theme.card_background,
            },
            styles: input.styles.clone(),
            title: GATE_TITLE,
            description: input.description.to_owned(),
            wallet,
            details,
            status,
            button: ButtonView {
                label: button_label(snapshot.status, input.amount),
                loading,
                disabled: loading,
            },
            error: snapshot.error.as_ref().map(ToString::to_string),
            security_message: SECURITY_MESSAGE,
            helper_text: HELPER_TEXT,
            helper_link_text: HELPER_LINK_TEXT,
        }
    }
}

fn detail_rows(input: &GateInput<'_>, wallet: Option<&WalletSummary>) -> Vec<DetailRow> {
    let mut rows = vec![
        DetailRow {
            label: "Amount",
            value: format_usd(input.amount),
        },
        DetailRow {
            label: "Wallet",
            value: wallet.map_or_else(|| "Not connected".to_owned(), |w| w.short_address.clone()),
        },
    ];
    if input.options.show_balance {
        rows.push(DetailRow {
            label: "Available Balance",
            value: format!("${}", input.balance),
        });
    }
    rows.push(DetailRow {
        label: "Currency",
        value: CURRENCY.to_owned(),
    });
    if input.options.show_network_info {
        rows.push(DetailRow {
            label: "Network",
            value: format!("Solana {}", input.network.label()),
        });
    }
    rows
}

/// Shortens an address to its first and last four characters, e.g. `abcd...wxyz`.
///
/// Addresses of eight characters or fewer are returned unchanged.
#[must_use]
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_owned();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// First two characters of the address, uppercased.
#[must_use]
pub fn avatar_initials(address: &str) -> String {
    address.chars().take(2).collect::<String>().to_uppercase()
}
