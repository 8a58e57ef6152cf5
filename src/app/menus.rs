//! Static menu tree and wizard field lists.
//!
//! ```text
//! LOCO (lock 1)      NEW | EDIT | DELETE
//! PROGRAM (lock 2)   CV MODIFICATION | PROG ON MAIN
//! SETTINGS (lock 2)  STOP MODE | WIFI ... | USER INTERFACE ... | RESET | CONTRAST
//! ```

use crate::app::flags::{DELETE_RECORD, EDIT_RECORD, LOCK_LIB, LOCK_OFF, LOCK_SET, NEW_LOCO};
use crate::app::library::SpeedSteps;
use crate::app::settings::StopMode;
use crate::app::{fields, text, Session};
use crate::config::{LOCO_NAME_LEN, STRING_LEN};
use crate::ui::menu::{MenuNode, NodeTarget};
use crate::ui::sequence::{FieldKind, WizardField};

type Node = MenuNode<Session>;
type Field = WizardField<Session>;

const TEXT: FieldKind = FieldKind::Text {
    max_len: STRING_LEN as u8,
    initial: "",
};

const IP: FieldKind = FieldKind::Ip {
    initial: [0, 0, 0, 0],
};

pub static LOCO_FIELDS: [Field; 3] = [
    Field {
        name: Some(&text::NAME),
        prefix: None,
        kind: FieldKind::Text {
            max_len: LOCO_NAME_LEN as u8,
            initial: "",
        },
        handler: Some(&fields::LOCO_NAME),
    },
    Field {
        name: Some(&text::ADDRESS),
        prefix: Some(&text::P_ADDRESS),
        kind: FieldKind::Integer {
            digits: 4,
            initial: Some(3),
        },
        handler: Some(&fields::LOCO_ADDRESS),
    },
    Field {
        name: Some(&text::SPEED_STEPS),
        prefix: Some(&text::P_STEPS),
        kind: FieldKind::Choice {
            options: &SpeedSteps::LABELS,
            initial: 2,
        },
        handler: Some(&fields::LOCO_STEPS),
    },
];

pub static CV_FIELDS: [Field; 2] = [
    Field {
        name: Some(&text::CV_NUMBER),
        prefix: Some(&text::P_CV),
        kind: FieldKind::Integer {
            digits: 4,
            initial: Some(1),
        },
        handler: Some(&fields::CV_NUMBER),
    },
    Field {
        name: Some(&text::VALUE),
        prefix: Some(&text::P_VALUE),
        kind: FieldKind::Integer {
            digits: 3,
            initial: None,
        },
        handler: Some(&fields::CV_VALUE),
    },
];

pub static POM_FIELDS: [Field; 3] = [
    Field {
        name: Some(&text::ADDRESS),
        prefix: Some(&text::P_ADDRESS),
        kind: FieldKind::Integer {
            digits: 4,
            initial: Some(3),
        },
        handler: Some(&fields::POM_ADDRESS),
    },
    Field {
        name: Some(&text::CV_NUMBER),
        prefix: Some(&text::P_CV),
        kind: FieldKind::Integer {
            digits: 4,
            initial: Some(1),
        },
        handler: Some(&fields::POM_CV),
    },
    Field {
        name: Some(&text::VALUE),
        prefix: Some(&text::P_VALUE),
        kind: FieldKind::Integer {
            digits: 3,
            initial: None,
        },
        handler: Some(&fields::POM_VALUE),
    },
];

/// Challenge shown before a locked node opens.
pub static PASSWORD_PROMPT: Field = Field {
    name: Some(&text::PASSWORD),
    prefix: Some(&text::P_PASSWORD),
    kind: FieldKind::Integer {
        digits: 4,
        initial: None,
    },
    handler: None,
};

static CHILD_LOCK_FIELDS: [Field; 1] = [Field {
    name: Some(&text::PASSWORD),
    prefix: Some(&text::P_PASSWORD),
    kind: FieldKind::Integer {
        digits: 4,
        initial: None,
    },
    handler: Some(&fields::CHILD_LOCK_PIN),
}];

static STOP_MODE_FIELDS: [Field; 1] = [Field {
    name: Some(&text::STOP_MODE),
    prefix: None,
    kind: FieldKind::Choice {
        options: &StopMode::LABELS,
        initial: 0,
    },
    handler: Some(&fields::STOP_MODE),
}];

static SSID_FIELDS: [Field; 1] = [Field {
    name: Some(&text::SSID),
    prefix: None,
    kind: TEXT,
    handler: Some(&fields::SSID),
}];

static WIFI_PASSWORD_FIELDS: [Field; 1] = [Field {
    name: Some(&text::PASSWORD),
    prefix: None,
    kind: TEXT,
    handler: Some(&fields::PASSWORD),
}];

static DHCP_FIELDS: [Field; 1] = [Field {
    name: Some(&text::DHCP),
    prefix: None,
    kind: FieldKind::Choice {
        options: &text::OFF_ON,
        initial: 1,
    },
    handler: Some(&fields::DHCP),
}];

static IP_FIELDS: [Field; 1] = [Field {
    name: Some(&text::IP),
    prefix: None,
    kind: IP,
    handler: Some(&fields::IP),
}];

static MASK_FIELDS: [Field; 1] = [Field {
    name: Some(&text::MASK),
    prefix: None,
    kind: IP,
    handler: Some(&fields::MASK),
}];

static GATEWAY_FIELDS: [Field; 1] = [Field {
    name: Some(&text::GATEWAY),
    prefix: None,
    kind: IP,
    handler: Some(&fields::GATEWAY),
}];

static STATION_IP_FIELDS: [Field; 1] = [Field {
    name: Some(&text::IP_STATION),
    prefix: None,
    kind: IP,
    handler: Some(&fields::STATION_IP),
}];

static WEB_PAGE_FIELDS: [Field; 1] = [Field {
    name: Some(&text::WEB_PAGE),
    prefix: None,
    kind: FieldKind::Choice {
        options: &text::NO_YES,
        initial: 0,
    },
    handler: Some(&fields::WEB_PAGE),
}];

static LANGUAGE_FIELDS: [Field; 1] = [Field {
    name: Some(&text::LANGUAGE),
    prefix: None,
    kind: FieldKind::Choice {
        options: &text::LANGUAGE_NAMES,
        initial: 1,
    },
    handler: Some(&fields::LANGUAGE),
}];

static IDLE_TIME_FIELDS: [Field; 1] = [Field {
    name: Some(&text::IDLE_TIME),
    prefix: Some(&text::P_MINUTES),
    kind: FieldKind::Integer {
        digits: 2,
        initial: Some(5),
    },
    handler: Some(&fields::IDLE_TIME),
}];

static RESET_FIELDS: [Field; 1] = [Field {
    name: Some(&text::RESET),
    prefix: None,
    kind: FieldKind::Choice {
        options: &text::RESET_CHOICES,
        initial: 0,
    },
    handler: Some(&fields::RESET),
}];

static CONTRAST_FIELDS: [Field; 1] = [Field {
    name: Some(&text::CONTRAST),
    prefix: None,
    kind: FieldKind::Integer {
        digits: 3,
        initial: Some(64),
    },
    handler: Some(&fields::CONTRAST),
}];

static LOCO_MENU: [Node; 3] = [
    Node {
        flags: NEW_LOCO,
        ..Node::new(&text::NEW, NodeTarget::Wizard(&LOCO_FIELDS))
    },
    Node {
        flags: EDIT_RECORD,
        ..Node::new(&text::EDIT, NodeTarget::Records(&fields::LOCO_RECORDS))
    },
    Node {
        flags: DELETE_RECORD,
        ..Node::new(&text::DELETE, NodeTarget::Records(&fields::LOCO_RECORDS))
    },
];

static PROGRAM_MENU: [Node; 2] = [
    Node::new(&text::CV_MENU, NodeTarget::Wizard(&CV_FIELDS)),
    Node::new(&text::POM_MENU, NodeTarget::Wizard(&POM_FIELDS)),
];

static WIFI_MENU: [Node; 8] = [
    Node::new(&text::SSID, NodeTarget::Wizard(&SSID_FIELDS)),
    Node::new(&text::PASSWORD, NodeTarget::Wizard(&WIFI_PASSWORD_FIELDS)),
    Node::new(&text::DHCP, NodeTarget::Wizard(&DHCP_FIELDS)),
    Node::new(&text::IP, NodeTarget::Wizard(&IP_FIELDS)),
    Node::new(&text::MASK, NodeTarget::Wizard(&MASK_FIELDS)),
    Node::new(&text::GATEWAY, NodeTarget::Wizard(&GATEWAY_FIELDS)),
    Node::new(&text::IP_STATION, NodeTarget::Wizard(&STATION_IP_FIELDS)),
    Node::new(&text::WEB_PAGE, NodeTarget::Wizard(&WEB_PAGE_FIELDS)),
];

// Setting a lock returns straight to USER INTERFACE.
static CHILD_LOCK_MENU: [Node; 3] = [
    Node {
        flags: LOCK_OFF,
        ..Node::new(&text::LOCK_OFF, NodeTarget::Action(&fields::CHILD_LOCK_OFF))
    },
    Node {
        flags: LOCK_SET,
        skip_on_return: true,
        ..Node::new(&text::LOCK_PROG, NodeTarget::Wizard(&CHILD_LOCK_FIELDS))
    },
    Node {
        flags: LOCK_LIB,
        skip_on_return: true,
        ..Node::new(&text::LOCK_LIB, NodeTarget::Wizard(&CHILD_LOCK_FIELDS))
    },
];

static USER_MENU: [Node; 3] = [
    Node::new(&text::LANGUAGE, NodeTarget::Wizard(&LANGUAGE_FIELDS)),
    Node::new(&text::CHILD_LOCK, NodeTarget::Submenu(&CHILD_LOCK_MENU)),
    Node::new(&text::IDLE_TIME, NodeTarget::Wizard(&IDLE_TIME_FIELDS)),
];

static SETTINGS_MENU: [Node; 5] = [
    Node::new(&text::STOP_MODE, NodeTarget::Wizard(&STOP_MODE_FIELDS)),
    Node::new(&text::WIFI, NodeTarget::Submenu(&WIFI_MENU)),
    Node::new(&text::USER_INTERFACE, NodeTarget::Submenu(&USER_MENU)),
    Node::new(&text::RESET, NodeTarget::Wizard(&RESET_FIELDS)),
    Node::new(&text::CONTRAST, NodeTarget::Wizard(&CONTRAST_FIELDS)),
];

pub static ROOT: [Node; 3] = [
    Node {
        lock: 1,
        ..Node::new(&text::LOCO, NodeTarget::Submenu(&LOCO_MENU))
    },
    Node {
        lock: 2,
        ..Node::new(&text::PROGRAM, NodeTarget::Submenu(&PROGRAM_MENU))
    },
    Node {
        lock: 2,
        ..Node::new(&text::SETTINGS, NodeTarget::Submenu(&SETTINGS_MENU))
    },
];
