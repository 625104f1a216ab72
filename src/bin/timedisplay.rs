//! Human-readable formatting of an elapsed [`time::Duration`], for the
//! "elapsed time" line `main.rs` prints after a run completes.

pub fn pretty_print_duration(d: time::Duration) -> String {
    let total_seconds = d.num_seconds();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = d.num_milliseconds() % 1000;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, millis.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_minute_durations_show_fractional_seconds() {
        let d = time::Duration::milliseconds(1500);
        assert_eq!(pretty_print_duration(d), "1.500s");
    }

    #[test]
    fn hour_scale_durations_drop_the_millisecond_component() {
        let d = time::Duration::seconds(3725);
        assert_eq!(pretty_print_duration(d), "1h 2m 5s");
    }
}
