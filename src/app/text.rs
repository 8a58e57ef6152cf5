//! Display strings, English first, Polish second.

use crate::ui::Label;

// Menu entries
pub static LOCO: Label = ["LOCO", "LOKOMOTYWA"];
pub static PROGRAM: Label = ["PROGRAM", "PROGRAMOWANIE"];
pub static SETTINGS: Label = ["SETTINGS", "USTAWIENIA"];
pub static USER_INTERFACE: Label = ["USER INTERFACE", "OBSLUGA"];
pub static NEW: Label = ["NEW", "NOWA"];
pub static NEW_Q: Label = ["NEW?", "NOWA?"];
pub static EDIT: Label = ["EDIT", "EDYCJA"];
pub static DELETE: Label = ["DELETE", "KASOWANIE"];
pub static CV_MENU: Label = ["CV MODIFICATION", "ZMIANA CV"];
pub static POM_MENU: Label = ["PROG ON MAIN", "PROG NA TOROWISKU"];
pub static STOP_MODE: Label = ["STOP MODE", "TRYB STOP"];
pub static WIFI: Label = ["WIFI", "WIFI"];
pub static LANGUAGE: Label = ["LANGUAGE", "JEZYK"];
pub static SSID: Label = ["SSID", "SSID"];
pub static PASSWORD: Label = ["PASSWORD", "HASLO"];
pub static DHCP: Label = ["DHCP", "DHCP"];
pub static IP: Label = ["IP", "IP"];
pub static MASK: Label = ["MASK", "MASK"];
pub static GATEWAY: Label = ["GATEWAY", "GATEWAY"];
pub static IP_STATION: Label = ["IP Z21", "IP Z21"];
pub static RESET: Label = ["RESET", "RESET"];
pub static CHILD_LOCK: Label = ["CHILD LOCK", "BLOKADA"];
pub static IDLE_TIME: Label = ["POWER DOWN TIME", "CZAS WYLACZANIA"];
pub static WEB_PAGE: Label = ["SHOW WEB PAGE", "POKAZ WEB STRONE"];
pub static CONTRAST: Label = ["CONTRAST", "KONTRAST"];
pub static LOCK_OFF: Label = ["OFF ", "OFF "];
pub static LOCK_PROG: Label = ["PROG ", "PROG "];
pub static LOCK_LIB: Label = ["LIB-PROG", "LIB-PROG"];

// Wizard fields and their prefixes
pub static NAME: Label = ["NAME", "NAZWA"];
pub static ADDRESS: Label = ["ADDRESS", "ADRES"];
pub static SPEED_STEPS: Label = ["SPEED STEPS", "KROKI PREDKOSCI"];
pub static CV_NUMBER: Label = ["CV NUMBER", "NUMER CV"];
pub static VALUE: Label = ["VALUE", "WARTOSC"];
pub static P_VALUE: Label = ["V", "W"];
pub static P_TURNOUT: Label = ["T", "Z"];
pub static P_ADDRESS: Label = ["L", "L"];
pub static P_CV: Label = ["CV", "CV"];
pub static P_STEPS: Label = ["SS", "SS"];
pub static P_PASSWORD: Label = ["P", "H"];
pub static P_MINUTES: Label = ["M", "M"];

// Error messages
pub static NO_RESPONSE: Label = ["NO RESPONCE", "BRAK ODPOWIEDZI"];
pub static NO_ACK: Label = ["NO ACK", "NO ACK"];
pub static LIB_EMPTY: Label = ["LIB EMPTY", "BIBL. JEST PUSTA"];
pub static LIB_FULL: Label = ["LIB FULL", "BIBL. JEST PELNA"];
pub static LOCO_EXIST: Label = ["LOCO EXIST", "LOCO JUZ ISTNIEJE"];
pub static WRONG_VALUE: Label = ["WRONG VALUE", "BLEDNA WARTOSC"];
pub static CONN_FAULT: Label = ["CONNECTION ERR", "BLAD POLACZENIA"];

// Choice lists; the editor shows them untranslated
pub static LANGUAGE_NAMES: [&str; 2] = ["ENGLISH", "POLSKI"];
pub static OFF_ON: [&str; 2] = ["OFF", "ON"];
pub static NO_YES: [&str; 2] = ["NO", "YES"];
pub static RESET_CHOICES: [&str; 3] = ["CANCEL", "SETTINGS", "ALL "];
