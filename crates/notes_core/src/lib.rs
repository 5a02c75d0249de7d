//! Notes core: pure control state machine and view-model helpers.
mod effect;
mod msg;
mod page_url;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::{ErrorSignal, Msg, StatusUpdate};
pub use page_url::{is_watch_page, watch_video_id};
pub use state::{ControlModel, ControlState};
pub use update::update;
pub use view_model::{
    ControlView, StyleTag, LABEL_DOWNLOAD, LABEL_ERROR, LABEL_GENERATING, LABEL_LOGIN,
    LABEL_READY, LABEL_WAITING_FOR_LOGIN,
};
