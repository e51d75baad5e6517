//! Session configuration handed to the hosted widget.
use crate::gateway::WidgetError;
use crate::types::{PaymentMethod, PaymentOrderHandle};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionConfig {
    pub key: String,
    /// Amount in minor units (paise for INR).
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub theme: Theme,
    pub config: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Theme {
    pub color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayConfig {
    pub display: Display,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Display {
    pub blocks: Blocks,
    pub sequence: Vec<String>,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Blocks {
    pub banks: Block,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Block {
    pub name: String,
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Instrument {
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Preferences {
    pub show_default_blocks: bool,
}

/// Storefront-side settings that do not come from the order handle.
#[derive(Debug, Clone)]
pub struct SessionBranding {
    pub merchant_name: String,
    pub theme_color: String,
    pub payment_methods: Vec<PaymentMethod>,
    /// Used when the order handle carries no currency.
    pub default_currency: String,
}

/// Converts a major-unit amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

impl SessionConfig {
    pub fn for_order(
        handle: &PaymentOrderHandle,
        order_id: &str,
        branding: &SessionBranding,
    ) -> Result<Self, WidgetError> {
        if handle.key.trim().is_empty() {
            return Err(WidgetError::Unavailable(
                "Payment key not available".to_string(),
            ));
        }
        if handle.payment_order_id.trim().is_empty() {
            return Err(WidgetError::Unavailable(
                "Payment order ID not available".to_string(),
            ));
        }
        let amount = to_minor_units(handle.amount).ok_or_else(|| {
            WidgetError::Unavailable(format!("Amount {} is out of range", handle.amount))
        })?;
        let currency = if handle.currency.trim().is_empty() {
            branding.default_currency.clone()
        } else {
            handle.currency.clone()
        };

        Ok(Self {
            key: handle.key.clone(),
            amount,
            currency,
            name: branding.merchant_name.clone(),
            description: format!("Order Payment - {}", order_id),
            order_id: handle.payment_order_id.clone(),
            theme: Theme {
                color: branding.theme_color.clone(),
            },
            config: DisplayConfig {
                display: Display {
                    blocks: Blocks {
                        banks: Block {
                            name: "All payment methods".to_string(),
                            instruments: branding
                                .payment_methods
                                .iter()
                                .map(|method| Instrument { method: *method })
                                .collect(),
                        },
                    },
                    sequence: vec!["block.banks".to_string()],
                    preferences: Preferences {
                        show_default_blocks: true,
                    },
                },
            },
        })
    }

    pub fn allowed_methods(&self) -> Vec<PaymentMethod> {
        self.config
            .display
            .blocks
            .banks
            .instruments
            .iter()
            .map(|instrument| instrument.method)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;
    use rust_decimal_macros::dec;

    fn handle(amount: Decimal) -> PaymentOrderHandle {
        PaymentOrderHandle {
            payment_order_id: "po_1".to_string(),
            provider: Provider::Razorpay,
            amount,
            currency: "INR".to_string(),
            key: "rzp_test_abc".to_string(),
        }
    }

    fn branding() -> SessionBranding {
        SessionBranding {
            merchant_name: "Dolce Fiore".to_string(),
            theme_color: "#1a1a1a".to_string(),
            payment_methods: PaymentMethod::all(),
            default_currency: "INR".to_string(),
        }
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(dec!(500.00)), Some(50000));
        assert_eq!(to_minor_units(dec!(19.999)), Some(2000));
        assert_eq!(to_minor_units(dec!(0.005)), Some(1));
        assert_eq!(to_minor_units(dec!(10.004)), Some(1000));
    }

    #[test]
    fn test_session_config_for_order() {
        let config = SessionConfig::for_order(&handle(dec!(500)), "ord_123", &branding()).unwrap();
        assert_eq!(config.amount, 50000);
        assert_eq!(config.key, "rzp_test_abc");
        assert_eq!(config.order_id, "po_1");
        assert_eq!(config.description, "Order Payment - ord_123");
        assert_eq!(config.allowed_methods(), PaymentMethod::all());

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["theme"]["color"], "#1a1a1a");
        assert_eq!(
            json["config"]["display"]["blocks"]["banks"]["instruments"][1]["method"],
            "netbanking"
        );
        assert_eq!(json["config"]["display"]["sequence"][0], "block.banks");
    }

    #[test]
    fn test_blank_currency_falls_back_to_default() {
        let mut handle = handle(dec!(12.50));
        handle.currency = " ".to_string();
        let branding = SessionBranding {
            default_currency: "USD".to_string(),
            ..branding()
        };
        let config = SessionConfig::for_order(&handle, "ord_1", &branding).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.amount, 1250);
    }

    #[test]
    fn test_session_config_requires_provider_order_id() {
        let mut handle = handle(dec!(1));
        handle.payment_order_id.clear();
        assert!(SessionConfig::for_order(&handle, "ord_1", &branding()).is_err());
    }
}
