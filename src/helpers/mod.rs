//! Display helpers shared by the commands

mod date;

pub use date::*;

use chrono::{DateTime, FixedOffset};

use crate::config::SiteConfig;

/// Helpers bound to a site configuration
pub struct Helpers<'a> {
    config: &'a SiteConfig,
}

impl<'a> Helpers<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Format a post date with the configured `date_format`
    pub fn date(&self, date: &DateTime<FixedOffset>) -> String {
        format_date(date, &self.config.date_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_uses_configured_format() {
        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2020, 1, 5, 9, 0, 0)
            .unwrap();

        let mut config = SiteConfig::default();
        assert_eq!(Helpers::new(&config).date(&date), "2020-01-05");

        config.date_format = "DD/MM/YYYY HH:mm".to_string();
        assert_eq!(Helpers::new(&config).date(&date), "05/01/2020 09:00");
    }
}
