use anyhow::Context;

pub const DEFAULT_CLASS_CAPACITY: usize = 5;
pub const DEFAULT_EMAIL_DOMAIN: &str = "kolping.edu.br";

pub const CAPACITY_ENV: &str = "SCHOOL_CLASS_CAPACITY";
pub const EMAIL_DOMAIN_ENV: &str = "SCHOOL_EMAIL_DOMAIN";

#[derive(Debug, Clone, PartialEq)]
pub struct SchoolConfig {
    /// Seats in a class created automatically on first enrolment.
    pub class_capacity: usize,
    pub email_domain: String,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            class_capacity: DEFAULT_CLASS_CAPACITY,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

impl SchoolConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(CAPACITY_ENV) {
            config.class_capacity = raw
                .trim()
                .parse()
                .with_context(|| format!("{CAPACITY_ENV} must be a whole number, got '{raw}'"))?;
        }
        if let Some(domain) = lookup(EMAIL_DOMAIN_ENV) {
            let domain = domain.trim();
            if !domain.is_empty() {
                config.email_domain = domain.to_string();
            }
        }

        Ok(config)
    }

    pub fn with_overrides(mut self, capacity: Option<usize>, email_domain: Option<String>) -> Self {
        if let Some(capacity) = capacity {
            self.class_capacity = capacity;
        }
        if let Some(domain) = email_domain {
            self.email_domain = domain;
        }
        self
    }

    pub fn staff_email_domain(&self) -> String {
        format!("docente.{}", self.email_domain)
    }
}
