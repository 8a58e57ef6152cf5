/// Decide whether the panel should be switched off after `idle_secs`
/// without a key press. An idle time of 0 minutes keeps it on.
pub fn display_should_sleep(idle_secs: u64, idle_time_min: u8) -> bool {
    if idle_time_min == 0 {
        return false;
    }

    idle_secs >= idle_time_min as u64 * 60
}
