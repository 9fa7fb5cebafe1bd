pub mod custom_tab;
pub mod entity;
pub mod parser;

pub use custom_tab::{custom_tab_info, is_custom_tab, CustomTabInfo, EXTRA_CUSTOM_TAB_SESSION};
pub use entity::{
    ExtraValue, Intent, IntentAction, EXTRA_LIB_REDIRECT_IGNORE, EXTRA_QUERY, EXTRA_TEXT,
};
pub use parser::{
    find_url_in_text, get_uri_from_intent, parse_search_intent, parse_send_action,
    parse_view_action,
};
