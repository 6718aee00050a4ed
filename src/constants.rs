pub const APP_NAME: &str = "APSCRON";
pub const DEFAULT_CONF: &str = "config/default";

pub const DEFAULT_NAVIGATION_DELAY_MS: u64 = 1000;
pub const DEFAULT_PAGE_PARAMETER: &str = "page";
