use serde::{Deserialize, Serialize};

/// Currencies the invoice editor offers. The set is closed on purpose:
/// a currency outside it can never reach a stored invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Sar,
    Usd,
    Eur,
    Gbp,
    Aed,
    Inr,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Sar
    }
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Sar,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aed,
        Currency::Inr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Sar => "SAR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aed => "AED",
            Currency::Inr => "INR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Sar => "SAR",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Aed => "AED",
            Currency::Inr => "₹",
        }
    }

    pub fn from_code(code: &str) -> Option<Currency> {
        let c = code.trim();
        Currency::ALL
            .into_iter()
            .find(|cur| cur.code().eq_ignore_ascii_case(c))
    }

    /// Unknown codes resolve to the default currency instead of failing;
    /// amounts must always be renderable.
    pub fn from_code_or_default(code: &str) -> Currency {
        Currency::from_code(code).unwrap_or_default()
    }
}

/// Currency-prefixed amount with exactly two decimals, no thousands
/// separators. `{:.2}` rounds the decimal expansion of the double
/// half-to-even, which matches the reference output for all practically
/// occurring prices.
pub fn format_amount(currency: Currency, v: f64) -> String {
    format!("{}{:.2}", currency.symbol(), v)
}
