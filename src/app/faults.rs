//! Error catalog shown on the Error page as `ERR nn`.

use crate::app::text;
use crate::ui::Fault;

/// Index of the ADDRESS field in the loco wizard.
pub const LOCO_ADDRESS_FIELD: usize = 1;

pub static NO_RESPONSE: Fault = Fault::new(1, &text::NO_RESPONSE);
pub static NO_ACK: Fault = Fault::new(2, &text::NO_ACK);
pub static LIB_EMPTY: Fault = Fault::new(7, &text::LIB_EMPTY);
pub static LIB_FULL: Fault = Fault::new(8, &text::LIB_FULL);
pub static LOCO_EXIST: Fault = Fault::new(10, &text::LOCO_EXIST).retry_at(LOCO_ADDRESS_FIELD);
pub static WRONG_VALUE: Fault = Fault::new(11, &text::WRONG_VALUE);
pub static CONN_FAULT: Fault = Fault::new(13, &text::CONN_FAULT);
