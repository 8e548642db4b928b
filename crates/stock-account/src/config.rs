//! Configuration: where the pending-invoice account comes from.

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use grni_accounting::{Account, Currency};
use grni_core::{CompanyId, DomainError, DomainResult};

const DEFAULT_CURRENCY: &str = "EUR";
const DEFAULT_DIGITS: i64 = 2;

/// Organisation-level configuration consumed from the host.
pub trait ConfigurationSource {
    /// The singleton pending-invoice holding account, if configured.
    fn pending_invoice_account(&self) -> Option<Account>;

    fn company_currency(&self, company: CompanyId) -> Option<Currency>;
}

/// Settings loaded from defaults, an optional file and `GRNI__*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAccountSettings {
    /// Code of the pending-invoice account.
    #[serde(default)]
    pub pending_invoice_account: Option<String>,
    pub company_currency: String,
    pub currency_digits: u32,
    pub log_json: bool,
}

impl Default for StockAccountSettings {
    fn default() -> Self {
        Self {
            pending_invoice_account: None,
            company_currency: DEFAULT_CURRENCY.to_string(),
            currency_digits: DEFAULT_DIGITS as u32,
            log_json: true,
        }
    }
}

impl StockAccountSettings {
    /// Load from `config/stock_account.*` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = dir.as_ref().join("stock_account");
        let config = Self::defaults()?
            .add_source(File::with_name(&file.to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("GRNI").separator("__"))
            .build()?;
        let settings: Self = config.try_deserialize()?;
        tracing::debug!(?settings, "stock account settings loaded");
        Ok(settings)
    }

    /// Parse TOML on top of the defaults (no environment overrides).
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("company_currency", DEFAULT_CURRENCY)?
            .set_default("currency_digits", DEFAULT_DIGITS)?
            .set_default("log_json", true)
    }

    pub fn currency(&self) -> Currency {
        Currency::new(self.company_currency.clone(), self.currency_digits)
    }
}

/// `ConfigurationSource` resolved from settings against a chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsConfiguration {
    pending_invoice_account: Option<Account>,
    company_currency: Currency,
}

impl SettingsConfiguration {
    pub fn new(pending_invoice_account: Option<Account>, company_currency: Currency) -> Self {
        Self {
            pending_invoice_account,
            company_currency,
        }
    }

    /// Fails when settings name an account code missing from `accounts`.
    pub fn resolve(settings: &StockAccountSettings, accounts: &[Account]) -> DomainResult<Self> {
        let pending_invoice_account = match settings.pending_invoice_account.as_deref() {
            None => None,
            Some(code) => Some(
                accounts
                    .iter()
                    .find(|a| a.code == code)
                    .cloned()
                    .ok_or_else(|| {
                        DomainError::configuration(format!(
                            "pending invoice account \"{code}\" does not exist"
                        ))
                    })?,
            ),
        };
        Ok(Self::new(pending_invoice_account, settings.currency()))
    }
}

impl ConfigurationSource for SettingsConfiguration {
    fn pending_invoice_account(&self) -> Option<Account> {
        self.pending_invoice_account.clone()
    }

    fn company_currency(&self, _company: CompanyId) -> Option<Currency> {
        Some(self.company_currency.clone())
    }
}
