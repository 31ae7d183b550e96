//! Theme presets and their resolved visual configuration.
//!
//! [`resolve`] is a total, pure mapping from a [`ThemePreset`] to a
//! `&'static` [`ThemeConfig`]: every preset, including unrecognized ones
//! ([`ThemePreset::Custom`]), yields a configuration with every slot filled.
//! Slots hold utility class lists for the presentation layer; the two
//! `*_background` slots hold inline CSS backgrounds.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::flow::PaymentStatus;

/// Visual preset selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemePreset {
    /// Branded light theme, the default.
    #[default]
    SolanaLight,
    /// Branded dark theme.
    SolanaDark,
    /// Branded gradient on a slate backdrop.
    Solana,
    /// Neutral light theme.
    Light,
    /// Neutral dark theme.
    Dark,
    /// Seeker teal on a deep backdrop.
    Seeker,
    /// Seeker variant with a translucent card.
    #[serde(rename = "seeker-2")]
    Seeker2,
    /// Green-on-black monospace.
    Terminal,
    /// Blue/purple gradient.
    Classic,
    /// Maximum contrast black, white and yellow.
    HighContrast,
    /// Any unrecognized preset; resolves to [`DEFAULT_THEME`].
    #[serde(other)]
    Custom,
}

impl ThemePreset {
    /// Every named preset, excluding [`ThemePreset::Custom`].
    pub const ALL: [Self; 10] = [
        Self::SolanaLight,
        Self::SolanaDark,
        Self::Solana,
        Self::Light,
        Self::Dark,
        Self::Seeker,
        Self::Seeker2,
        Self::Terminal,
        Self::Classic,
        Self::HighContrast,
    ];

    /// Tag of this preset, e.g. `"solana-light"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SolanaLight => "solana-light",
            Self::SolanaDark => "solana-dark",
            Self::Solana => "solana",
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Seeker => "seeker",
            Self::Seeker2 => "seeker-2",
            Self::Terminal => "terminal",
            Self::Classic => "classic",
            Self::HighContrast => "high-contrast",
            Self::Custom => "custom",
        }
    }

    /// Parses a tag. Unknown tags map to [`ThemePreset::Custom`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(tag))
            .unwrap_or(Self::Custom)
    }

    /// Returns `true` when the card renders light text on a dark surface.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(
            self,
            Self::SolanaDark
                | Self::Dark
                | Self::Seeker
                | Self::Seeker2
                | Self::Terminal
                | Self::HighContrast
        )
    }

    /// Class applied to the host document so externally rendered wallet UI
    /// (the wallet-selection modal) follows the preset.
    #[must_use]
    pub fn ambient_class(self) -> String {
        format!("wallet-adapter-theme-{}", self.as_str())
    }
}

impl fmt::Display for ThemePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreset {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Resolved styling for every visual slot of the paywall gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ThemeConfig {
    /// Full-page container.
    pub container: &'static str,
    /// Inline background of the container.
    pub container_background: &'static str,
    /// Card surface.
    pub card: &'static str,
    /// Inline background of the card.
    pub card_background: &'static str,
    /// Brand icon badge.
    pub icon: &'static str,
    /// Card title.
    pub title: &'static str,
    /// Card subtitle.
    pub subtitle: &'static str,
    /// Pay button.
    pub button: &'static str,
    /// Payment-details panel.
    pub payment_details: &'static str,
    /// Notice banner.
    pub notice: &'static str,
    /// Connected-wallet panel.
    pub wallet_section: &'static str,
    /// Security message line.
    pub security_message: &'static str,
    /// Helper text below the button.
    pub helper_text: &'static str,
    /// Link inside the helper text.
    pub helper_link: &'static str,
    /// Payment status banner.
    pub status_accent: &'static str,
}

impl ThemeConfig {
    /// Every slot as `(name, value)`, in declaration order.
    #[must_use]
    pub const fn slots(&self) -> [(&'static str, &'static str); 15] {
        [
            ("container", self.container),
            ("container_background", self.container_background),
            ("card", self.card),
            ("card_background", self.card_background),
            ("icon", self.icon),
            ("title", self.title),
            ("subtitle", self.subtitle),
            ("button", self.button),
            ("payment_details", self.payment_details),
            ("notice", self.notice),
            ("wallet_section", self.wallet_section),
            ("security_message", self.security_message),
            ("helper_text", self.helper_text),
            ("helper_link", self.helper_link),
            ("status_accent", self.status_accent),
        ]
    }
}

const LIGHT_BACKDROP: &str =
    "bg-gradient-to-b from-white via-pink-50 via-purple-50 via-blue-50 to-cyan-50";
const SLATE_BACKDROP: &str = "bg-gradient-to-br from-slate-900 via-slate-800 to-slate-900";
const SEEKER_BACKGROUND: &str = "radial-gradient(25% 200% at 50% 50%, #6CCEC6 0%, rgba(19, 77, 128, 0) 30%), radial-gradient(20% 20% at 50% 100%, rgba(66, 202, 189, 0.8) 0%, rgba(33, 100, 94, 0.8) 0%), linear-gradient(180deg, #001214 5%, #0D2734 100%)";
const NO_BACKGROUND: &str = "none";

/// Configuration used for [`ThemePreset::Custom`].
pub static DEFAULT_THEME: ThemeConfig = ThemeConfig {
    container: SLATE_BACKDROP,
    container_background: NO_BACKGROUND,
    card: "bg-white/95 backdrop-blur-sm rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-slate-600",
    title: "text-slate-900",
    subtitle: "text-slate-600",
    button: "bg-slate-600 hover:bg-slate-700 text-white rounded-full",
    payment_details: "bg-slate-50 border-slate-200 rounded-lg",
    notice: "bg-amber-50 border-amber-200 text-amber-800 rounded-lg",
    wallet_section: "bg-slate-50 border border-slate-200 rounded-lg",
    security_message: "text-slate-400",
    helper_text: "text-slate-600",
    helper_link: "text-slate-900 underline",
    status_accent: "text-slate-700",
};

static SOLANA_LIGHT: ThemeConfig = ThemeConfig {
    container: LIGHT_BACKDROP,
    container_background: NO_BACKGROUND,
    card: "bg-white/95 backdrop-blur-sm border border-slate-200 shadow-2xl rounded-2xl",
    card_background: NO_BACKGROUND,
    icon: "bg-gradient-to-r from-blue-600 to-purple-600",
    title: "text-slate-900",
    subtitle: "text-slate-600",
    button: "bg-solana-gradient hover:opacity-90 text-white font-light rounded-full",
    payment_details: "bg-slate-50 border border-slate-200 rounded-xl",
    notice: "text-slate-600",
    wallet_section: "bg-slate-50 border border-slate-200 rounded-xl",
    security_message: "text-slate-600",
    helper_text: "text-slate-600",
    helper_link: "text-purple-600 underline",
    status_accent: "text-purple-700",
};

static SOLANA_DARK: ThemeConfig = ThemeConfig {
    container: "bg-transparent",
    container_background: "radial-gradient(circle at center, #ec4899 0%, #3b82f6 50%, #9333ea 100%)",
    card: "!bg-[#171719] border-0 text-white rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-slate-600",
    title: "text-white",
    subtitle: "text-slate-400",
    button: "bg-solana-gradient hover:opacity-90 text-white rounded-full",
    payment_details: "bg-[#0000001F] border-slate-600 text-white rounded-lg",
    notice: "bg-amber-900/50 border-amber-700 text-white rounded-lg",
    wallet_section: "bg-[#0000001F] border border-slate-600 rounded-lg",
    security_message: "text-slate-400",
    helper_text: "text-slate-400",
    helper_link: "text-purple-400 underline",
    status_accent: "text-purple-300",
};

static SOLANA: ThemeConfig = ThemeConfig {
    container: SLATE_BACKDROP,
    container_background: NO_BACKGROUND,
    card: "bg-white/95 backdrop-blur-sm border-solana-primary/20 rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-solana-gradient",
    title: "bg-solana-gradient bg-clip-text text-transparent",
    subtitle: "text-slate-600",
    button: "bg-solana-gradient hover:opacity-90 text-white rounded-lg",
    payment_details: "bg-gradient-to-r from-slate-50 to-slate-100 border-slate-200 rounded-lg",
    notice: "bg-amber-50 border-amber-200 text-amber-800 rounded-lg",
    wallet_section: "bg-slate-50 border border-slate-200 rounded-lg",
    security_message: "text-slate-600",
    helper_text: "text-slate-600",
    helper_link: "text-purple-600 underline",
    status_accent: "text-purple-700",
};

static LIGHT: ThemeConfig = ThemeConfig {
    container: LIGHT_BACKDROP,
    container_background: NO_BACKGROUND,
    card: "bg-white/95 backdrop-blur-sm border border-slate-200 shadow-2xl rounded-2xl",
    card_background: NO_BACKGROUND,
    icon: "bg-gradient-to-r from-blue-600 to-purple-600",
    title: "text-slate-900",
    subtitle: "text-slate-600",
    button: "bg-black hover:bg-gray-800 text-white font-light rounded-full",
    payment_details: "bg-slate-50 border border-slate-200 rounded-xl",
    notice: "text-slate-600",
    wallet_section: "bg-slate-50 border border-slate-200 rounded-xl",
    security_message: "text-slate-600",
    helper_text: "text-slate-600",
    helper_link: "text-purple-600 underline",
    status_accent: "text-slate-900",
};

static DARK: ThemeConfig = ThemeConfig {
    container: "bg-transparent",
    container_background: "radial-gradient(circle at center, #ec4899 0%, #3b82f6 50%, #9333ea 100%)",
    card: "!bg-[#171719] border-slate-700 text-white rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-slate-600",
    title: "text-white",
    subtitle: "text-slate-400",
    button: "bg-slate-600 hover:bg-slate-700 rounded-full",
    payment_details: "bg-[#0000001F] border-slate-600 text-white rounded-lg",
    notice: "bg-amber-900/50 border-amber-700 text-white rounded-lg",
    wallet_section: "bg-[#0000001F] border border-slate-600 rounded-lg",
    security_message: "text-slate-400",
    helper_text: "text-slate-400",
    helper_link: "text-white underline",
    status_accent: "text-slate-200",
};

static SEEKER: ThemeConfig = ThemeConfig {
    container: "bg-transparent",
    container_background: SEEKER_BACKGROUND,
    card: "backdrop-blur-sm border-emerald-200 rounded-xl",
    card_background: "#171719",
    icon: "bg-gradient-to-r from-emerald-500 to-teal-500",
    title: "text-white",
    subtitle: "text-emerald-200",
    button: "bg-gradient-to-r from-emerald-500 to-teal-500 hover:from-emerald-600 hover:to-teal-600 text-white rounded-full",
    payment_details: "bg-[#0000001F] border-emerald-700 text-white rounded-lg",
    notice: "bg-cyan-50 border-cyan-200 text-cyan-800 rounded-lg",
    wallet_section: "bg-[#0000001F] border border-emerald-700 rounded-lg",
    security_message: "text-white",
    helper_text: "text-emerald-100",
    helper_link: "text-teal-300 underline",
    status_accent: "text-teal-200",
};

static SEEKER_2: ThemeConfig = ThemeConfig {
    card_background: "rgba(29, 35, 35, 1)",
    card: "backdrop-blur-[12px] border-emerald-200 rounded-xl",
    ..SEEKER
};

static TERMINAL: ThemeConfig = ThemeConfig {
    container: "bg-gradient-to-br from-gray-900 via-black to-gray-800",
    container_background: NO_BACKGROUND,
    card: "bg-black/90 backdrop-blur-sm border-green-400/30 text-green-400 rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-green-400 text-black",
    title: "text-green-400 font-mono",
    subtitle: "text-green-300",
    button: "bg-green-400 text-black hover:bg-green-300 font-mono rounded-full",
    payment_details: "bg-gray-900/50 border-green-400/20 text-green-300 rounded-lg",
    notice: "bg-yellow-900/50 border-yellow-400/30 text-yellow-300 rounded-lg",
    wallet_section: "bg-gray-900/50 border border-green-400/20 font-mono rounded-lg",
    security_message: "text-green-300",
    helper_text: "text-green-300 font-mono",
    helper_link: "text-green-400 underline",
    status_accent: "text-green-400 font-mono",
};

static CLASSIC: ThemeConfig = ThemeConfig {
    container: SLATE_BACKDROP,
    container_background: NO_BACKGROUND,
    card: "bg-white/95 backdrop-blur-sm border-slate-200 rounded-xl",
    card_background: NO_BACKGROUND,
    icon: "bg-gradient-to-r from-blue-600 to-purple-600",
    title: "bg-gradient-to-r from-blue-600 to-purple-600 bg-clip-text text-transparent",
    subtitle: "text-slate-600",
    button: "bg-gradient-to-r from-blue-600 to-purple-600 hover:from-blue-700 hover:to-purple-700 text-white",
    payment_details: "bg-gradient-to-r from-slate-50 to-slate-100 border-slate-200 rounded-lg",
    notice: "bg-amber-50 border-amber-200 text-amber-800 rounded-lg",
    wallet_section: "bg-slate-50 border border-slate-200 rounded-lg",
    security_message: "text-slate-600",
    helper_text: "text-slate-600",
    helper_link: "text-blue-600 underline",
    status_accent: "text-blue-700",
};

static HIGH_CONTRAST: ThemeConfig = ThemeConfig {
    container: "bg-black",
    container_background: NO_BACKGROUND,
    card: "bg-black border-2 border-white text-white rounded-none",
    card_background: NO_BACKGROUND,
    icon: "bg-yellow-300 text-black",
    title: "text-white font-bold",
    subtitle: "text-white",
    button: "bg-yellow-300 text-black font-bold border-2 border-white hover:bg-yellow-200 rounded-none",
    payment_details: "bg-black border-2 border-white text-white rounded-none",
    notice: "bg-black border-2 border-yellow-300 text-yellow-300 rounded-none",
    wallet_section: "bg-black border-2 border-white rounded-none",
    security_message: "text-white",
    helper_text: "text-white",
    helper_link: "text-yellow-300 underline font-bold",
    status_accent: "text-yellow-300 font-bold",
};

/// Resolves the configuration for `preset`.
#[must_use]
pub const fn resolve(preset: ThemePreset) -> &'static ThemeConfig {
    match preset {
        ThemePreset::SolanaLight => &SOLANA_LIGHT,
        ThemePreset::SolanaDark => &SOLANA_DARK,
        ThemePreset::Solana => &SOLANA,
        ThemePreset::Light => &LIGHT,
        ThemePreset::Dark => &DARK,
        ThemePreset::Seeker => &SEEKER,
        ThemePreset::Seeker2 => &SEEKER_2,
        ThemePreset::Terminal => &TERMINAL,
        ThemePreset::Classic => &CLASSIC,
        ThemePreset::HighContrast => &HIGH_CONTRAST,
        ThemePreset::Custom => &DEFAULT_THEME,
    }
}

/// Joins class lists, skipping empty pieces.
#[must_use]
pub fn join_classes<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a USD amount with two decimals and thousands separators, e.g. `$1,234.50`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.abs().round_dp(2));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}

/// Label of the pay button for the given status.
#[must_use]
pub fn button_label(status: PaymentStatus, amount: Decimal) -> String {
    match status {
        PaymentStatus::Pending => "Processing Payment...".to_owned(),
        PaymentStatus::Idle | PaymentStatus::Success | PaymentStatus::Error => {
            format!("Pay {} USDC", format_usd(amount))
        }
    }
}

/// Message of the status banner, or `None` when nothing should be shown.
#[must_use]
pub fn status_message(status: PaymentStatus, error: Option<&PaymentError>) -> Option<String> {
    match status {
        PaymentStatus::Idle => None,
        PaymentStatus::Pending => Some("Processing payment...".to_owned()),
        PaymentStatus::Success => Some("Payment successful".to_owned()),
        PaymentStatus::Error => Some(
            error.map_or_else(|| "Payment failed".to_owned(), ToString::to_string),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_total() {
        for preset in ThemePreset::ALL.into_iter().chain([ThemePreset::Custom]) {
            for (slot, value) in resolve(preset).slots() {
                assert!(!value.trim().is_empty(), "{preset}: slot {slot} is empty");
            }
        }
    }

    #[test]
    fn test_resolve_is_pure() {
        for preset in ThemePreset::ALL {
            assert_eq!(resolve(preset), resolve(preset));
            assert!(std::ptr::eq(resolve(preset), resolve(preset)));
        }
    }

    #[test]
    fn test_unknown_preset_resolves_to_default() {
        let preset = ThemePreset::parse("neon-unicorn");
        assert_eq!(preset, ThemePreset::Custom);
        assert_eq!(resolve(preset), &DEFAULT_THEME);

        let from_json: ThemePreset = serde_json::from_str("\"neon-unicorn\"").unwrap();
        assert_eq!(from_json, ThemePreset::Custom);
    }

    #[test]
    fn test_tags_round_trip() {
        for preset in ThemePreset::ALL {
            assert_eq!(ThemePreset::parse(preset.as_str()), preset);
            let json = serde_json::to_string(&preset).unwrap();
            assert_eq!(json, format!("\"{}\"", preset.as_str()));
            assert_eq!(serde_json::from_str::<ThemePreset>(&json).unwrap(), preset);
        }
        assert_eq!("Seeker-2".parse::<ThemePreset>().unwrap(), ThemePreset::Seeker2);
    }

    #[test]
    fn test_default_is_branded_light() {
        assert_eq!(ThemePreset::default(), ThemePreset::SolanaLight);
        assert!(!ThemePreset::default().is_dark());
        assert_eq!(
            ThemePreset::Terminal.ambient_class(),
            "wallet-adapter-theme-terminal"
        );
    }

    #[test]
    fn test_seeker_variant_inherits_seeker_slots() {
        let seeker = resolve(ThemePreset::Seeker);
        let seeker2 = resolve(ThemePreset::Seeker2);
        assert_eq!(seeker.button, seeker2.button);
        assert_ne!(seeker.card_background, seeker2.card_background);
    }

    #[test]
    fn test_join_classes_skips_empty() {
        assert_eq!(
            join_classes(["w-full", "", "  ", "bg-black "]),
            "w-full bg-black"
        );
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(250, 2)), "$2.50");
        assert_eq!(format_usd(Decimal::new(1, 2)), "$0.01");
        assert_eq!(format_usd(Decimal::new(12_345, 1)), "$1,234.50");
        assert_eq!(format_usd(Decimal::from(1_000_000)), "$1,000,000.00");
    }

    #[test]
    fn test_button_label_per_status() {
        let amount = Decimal::new(250, 2);
        assert_eq!(button_label(PaymentStatus::Idle, amount), "Pay $2.50 USDC");
        assert_eq!(
            button_label(PaymentStatus::Pending, amount),
            "Processing Payment..."
        );
        assert_eq!(button_label(PaymentStatus::Error, amount), "Pay $2.50 USDC");
    }

    #[test]
    fn test_status_message() {
        assert_eq!(status_message(PaymentStatus::Idle, None), None);
        assert_eq!(
            status_message(
                PaymentStatus::Error,
                Some(&PaymentError::WalletNotConnected)
            )
            .as_deref(),
            Some("Wallet not connected")
        );
    }
}
