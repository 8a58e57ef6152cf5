//! On-device loco library.
//!
//! A bounded list of locomotives plus the selection used by the loco page.
//! The selection may sit one past the last record; that position is the
//! "NEW?" entry which starts the new-loco wizard.

use crate::config::{LOCO_LIST_LEN, LOCO_NAME_LEN};
use crate::error::LibraryError;
use crate::ui::input_logic::{select_next, select_prev};
use heapless::{String, Vec};

/// DCC speed-step mode of a decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedSteps {
    Steps14,
    Steps28,
    #[default]
    Steps128,
}

impl SpeedSteps {
    /// Choice list shown by the SPEED STEPS field, in index order.
    pub const LABELS: [&'static str; 3] = ["14", "28", "128"];

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(SpeedSteps::Steps14),
            1 => Some(SpeedSteps::Steps28),
            2 => Some(SpeedSteps::Steps128),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn count(self) -> u8 {
        match self {
            SpeedSteps::Steps14 => 14,
            SpeedSteps::Steps28 => 28,
            SpeedSteps::Steps128 => 128,
        }
    }

    /// Mode for a step count reported by the command station.
    pub fn from_count(count: u8) -> Self {
        match count {
            14 => SpeedSteps::Steps14,
            28 => SpeedSteps::Steps28,
            _ => SpeedSteps::Steps128,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loco {
    pub name: String<LOCO_NAME_LEN>,
    pub addr: u16,
    pub steps: SpeedSteps,
    /// Throttle notch in `-LOCO_MAX_STEP..=LOCO_MAX_STEP`, negative is reverse.
    pub speed: i8,
    /// Bit n holds function Fn.
    pub functions: u32,
    /// Direction shown while stopped.
    pub reverse: bool,
}

impl Loco {
    pub fn new(name: &str, addr: u16, steps: SpeedSteps) -> Self {
        let mut loco = Loco {
            addr,
            steps,
            ..Loco::default()
        };
        loco.set_name(name);
        loco
    }

    /// Replace the name, truncated to `LOCO_NAME_LEN`.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
    }

    pub fn function(&self, index: u8) -> bool {
        index < 32 && self.functions & (1 << index) != 0
    }
}

impl Default for Loco {
    fn default() -> Self {
        Self {
            name: String::new(),
            addr: 3,
            steps: SpeedSteps::Steps128,
            speed: 0,
            functions: 0,
            reverse: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Library {
    locos: Vec<Loco, LOCO_LIST_LEN>,
    selected: usize,
}

impl Library {
    pub const fn new() -> Self {
        Self {
            locos: Vec::new(),
            selected: 0,
        }
    }

    /// Factory library: one loco at address 3.
    pub fn with_default() -> Self {
        let mut library = Self::new();
        let _ = library.locos.push(Loco::new("DEFLT", 3, SpeedSteps::Steps128));
        library
    }

    pub fn len(&self) -> usize {
        self.locos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locos.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.locos.is_full()
    }

    pub fn get(&self, index: usize) -> Option<&Loco> {
        self.locos.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loco> {
        self.locos.iter()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Select `index`; anything past the end lands on the "NEW?" entry.
    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.locos.len());
    }

    pub fn select_next(&mut self) {
        self.selected = select_next(self.selected, self.locos.len() + 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = select_prev(self.selected, self.locos.len() + 1);
    }

    /// The selected loco, or `None` on the "NEW?" entry.
    pub fn current(&self) -> Option<&Loco> {
        self.locos.get(self.selected)
    }

    pub fn current_mut(&mut self) -> Option<&mut Loco> {
        self.locos.get_mut(self.selected)
    }

    fn check_addr(&self, addr: u16, except: Option<usize>) -> Result<(), LibraryError> {
        match self
            .locos
            .iter()
            .position(|l| l.addr == addr)
            .filter(|&i| Some(i) != except)
        {
            Some(i) => Err(LibraryError::Duplicate(i)),
            None => Ok(()),
        }
    }

    /// Append a loco; returns its index.
    pub fn add(&mut self, loco: Loco) -> Result<usize, LibraryError> {
        if self.locos.is_full() {
            return Err(LibraryError::Full);
        }
        self.check_addr(loco.addr, None)?;
        self.locos.push(loco).map_err(|_| LibraryError::Full)?;
        Ok(self.locos.len() - 1)
    }

    /// Overwrite the stored fields of record `index`, keeping its running state.
    pub fn replace(&mut self, index: usize, loco: &Loco) -> Result<(), LibraryError> {
        if index >= self.locos.len() {
            return Err(LibraryError::NoSuchRecord);
        }
        self.check_addr(loco.addr, Some(index))?;
        let slot = &mut self.locos[index];
        slot.name = loco.name.clone();
        slot.addr = loco.addr;
        slot.steps = loco.steps;
        Ok(())
    }

    /// Remove record `index`; later records move down one slot.
    pub fn remove(&mut self, index: usize) -> Result<Loco, LibraryError> {
        if self.locos.is_empty() {
            return Err(LibraryError::Empty);
        }
        if index >= self.locos.len() {
            return Err(LibraryError::NoSuchRecord);
        }
        let removed = self.locos.remove(index);
        if self.selected > index {
            self.selected -= 1;
        }
        self.selected = self.selected.min(self.locos.len());
        Ok(removed)
    }

    /// Append without the duplicate check, used when loading a stored record.
    pub(crate) fn restore(&mut self, loco: Loco) -> Result<(), LibraryError> {
        self.locos.push(loco).map_err(|_| LibraryError::Full)
    }

    pub fn clear(&mut self) {
        self.locos.clear();
        self.selected = 0;
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::with_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> Library {
        let mut lib = Library::new();
        for (name, addr) in [("BR01", 1), ("BR03", 3), ("V200", 200)] {
            lib.add(Loco::new(name, addr, SpeedSteps::Steps28)).unwrap();
        }
        lib
    }

    #[test]
    fn default_library_has_one_loco() {
        let lib = Library::default();
        assert_eq!(lib.len(), 1);
        let loco = lib.current().unwrap();
        assert_eq!(loco.name.as_str(), "DEFLT");
        assert_eq!(loco.addr, 3);
        assert_eq!(loco.steps, SpeedSteps::Steps128);
    }

    #[test]
    fn duplicate_address_is_refused() {
        let mut lib = three();
        assert_eq!(
            lib.add(Loco::new("COPY", 3, SpeedSteps::Steps14)),
            Err(LibraryError::Duplicate(1))
        );
        assert_eq!(lib.len(), 3);
    }

    #[test]
    fn replace_may_keep_own_address() {
        let mut lib = three();
        lib.replace(1, &Loco::new("BR03A", 3, SpeedSteps::Steps14)).unwrap();
        assert_eq!(lib.get(1).unwrap().name.as_str(), "BR03A");
        assert_eq!(
            lib.replace(1, &Loco::new("X", 200, SpeedSteps::Steps14)),
            Err(LibraryError::Duplicate(2))
        );
        assert_eq!(
            lib.replace(7, &Loco::default()),
            Err(LibraryError::NoSuchRecord)
        );
    }

    #[test]
    fn replace_keeps_running_state() {
        let mut lib = three();
        lib.select(0);
        lib.current_mut().unwrap().speed = 7;
        lib.replace(0, &Loco::new("NEW", 1, SpeedSteps::Steps14)).unwrap();
        assert_eq!(lib.get(0).unwrap().speed, 7);
    }

    #[test]
    fn full_library_refuses_add() {
        let mut lib = Library::new();
        for addr in 0..LOCO_LIST_LEN as u16 {
            lib.add(Loco::new("L", addr + 1, SpeedSteps::Steps128)).unwrap();
        }
        assert!(lib.is_full());
        assert_eq!(
            lib.add(Loco::new("L", 999, SpeedSteps::Steps128)),
            Err(LibraryError::Full)
        );
    }

    #[test]
    fn remove_shifts_records_down() {
        let mut lib = three();
        lib.select(2);
        let removed = lib.remove(0).unwrap();
        assert_eq!(removed.addr, 1);
        assert_eq!(lib.get(0).unwrap().addr, 3);
        assert_eq!(lib.get(1).unwrap().addr, 200);
        assert_eq!(lib.selected(), 1);
    }

    #[test]
    fn remove_from_empty_library() {
        let mut lib = Library::new();
        assert_eq!(lib.remove(0), Err(LibraryError::Empty));
    }

    #[test]
    fn selection_includes_new_entry() {
        let mut lib = three();
        lib.select(2);
        lib.select_next();
        assert_eq!(lib.selected(), 3);
        assert!(lib.current().is_none());
        lib.select_next();
        assert_eq!(lib.selected(), 0);
        lib.select_prev();
        assert_eq!(lib.selected(), 3);
    }

    #[test]
    fn names_are_truncated() {
        let loco = Loco::new("LONGNAME", 5, SpeedSteps::Steps14);
        assert_eq!(loco.name.as_str(), "LONGNA");
    }
}
