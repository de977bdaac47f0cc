use clap::builder::{
    styling::{AnsiColor, Effects},
    Styles,
};
use std::time::Duration;

/// Format duration for display in HH:MM:SS format.
///
/// Displays time with hours as the maximum unit (no days).
/// Format: `HH:MM:SS` where hours can exceed 24.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tomo_launch::utils::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "00:00:45");
/// assert_eq!(format_duration(Duration::from_secs(1845)), "00:30:45");
/// assert_eq!(format_duration(Duration::from_secs(90000)), "25:00:00");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Join tokens into one line that can be pasted into a POSIX shell.
///
/// # Examples
///
/// ```
/// use tomo_launch::utils::shell_join;
///
/// assert_eq!(shell_join(["mpirun", "-np", "4"]), "mpirun -np 4");
/// assert_eq!(shell_join(["echo", "two words"]), "echo 'two words'");
/// ```
pub fn shell_join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|t| shell_escape::escape(t.as_ref().to_string().into()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

pub const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());
