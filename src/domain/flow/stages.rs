//! Stage names exposed to the UI as `CurrentStage`

pub const MENU: &str = "MENU";
pub const START: &str = "START";
pub const WAIT_TERMINATION_REASON: &str = "WAIT_TERMINATION_REASON";
pub const ASK_KNOWS_PROVIDER: &str = "ASK_KNOWS_PROVIDER";
pub const ASK_PROVIDER_INPUT: &str = "ASK_PROVIDER_INPUT";
pub const ASK_NO_FLOW_FILTERS: &str = "ASK_NO_FLOW_FILTERS";
pub const SHOW_PROVIDER_LIST: &str = "SHOW_PROVIDER_LIST";
pub const SHOW_PROVIDER_ADDRESS: &str = "SHOW_PROVIDER_ADDRESS";
pub const WAIT_FOLLOWUP: &str = "WAIT_FOLLOWUP";
pub const PROVIDER_ID_ONLY_WARNING: &str = "PROVIDER_ID_ONLY_WARNING";
pub const ASK_SPECIALIST_SERVICE: &str = "ASK_SPECIALIST_SERVICE";
pub const ASK_SPECIALIST_FILTERS: &str = "ASK_SPECIALIST_FILTERS";
pub const SPECIALIST_ADDRESS: &str = "SPECIALIST_ADDRESS";
pub const SPECIALIST_COMPLETED: &str = "SPECIALIST_COMPLETED";
pub const COMPLETED: &str = "COMPLETED";
pub const CLOSED: &str = "CLOSED";
pub const ERROR: &str = "ERROR";

/// Stage reported when a traversal ended without setting one
pub const END: &str = "END";
