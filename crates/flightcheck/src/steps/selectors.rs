//! DOM contract of the flight calendar app.

/// Any of these means the first render finished: month blocks, the
/// connection-error banner, or a centered status message.
pub const READY: &str = r#".month, .connection-error, [style*="text-align:center"]"#;

pub const HEADER_HEADING: &str = "header h1";

pub const CALENDAR_PANEL: &str = "#panelCalendar";
pub const CALENDAR_WRAP: &str = "#panelCalendar .calendar-wrap";
pub const MONTH: &str = ".month";
pub const TODAY: &str = "#today";
pub const EVENT: &str = ".event";

/// Bottom navigation, addressed by position: calendar, upcoming, departed.
pub const NAV_ITEM: &str = ".bn-item";
pub const NAV_CALENDAR: usize = 0;
pub const NAV_UPCOMING: usize = 1;
pub const NAV_DEPARTED: usize = 2;

pub const UPCOMING_PANEL: &str = "#panelUpcoming";
pub const UPCOMING_LIST: &str = "#listUpcoming";
pub const UPCOMING_CARDS: &str = "#listUpcoming .lcard";
pub const DEPARTED_PANEL: &str = "#panelDeparted";
pub const DEPARTED_CARDS: &str = "#listDeparted .lcard";

pub const MODAL: &str = "#flightModal";
pub const MODAL_BODY: &str = "#modalBody";
pub const MODAL_CLOSE: &str = "#closeModal";

pub const REFRESH: &str = "#refreshBtn";
pub const REFRESH_BUSY_CLASS: &str = "spinning";

pub const BADGE: &str = "#badgeUpcoming";
pub const BADGE_COUNT_ATTR: &str = "data-count";

/// Text the app shows when there are no flights.
pub const NO_FLIGHTS_TEXT: &str = "沒有航班";
/// Text the app shows when loading failed ("load failed", "failed").
pub const LOAD_FAILED_TEXTS: &[&str] = &["載入失敗", "失敗"];
