use super::*;
use chrono::{Datelike, Timelike, Weekday};

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

#[test]
fn test_five_fields_gain_seconds() {
    assert_eq!(normalize("0 2 * * *").unwrap(), "0 0 2 * * *");
    assert_eq!(normalize("  */15 * * * *  ").unwrap(), "0 */15 * * * *");
}

#[test]
fn test_six_fields_pass_through() {
    assert_eq!(normalize("30 0 2 * * *").unwrap(), "30 0 2 * * *");
}

#[test]
fn test_shorthands() {
    assert_eq!(normalize("@daily").unwrap(), "0 0 0 * * *");
    assert_eq!(normalize("@HOURLY").unwrap(), "0 0 * * * *");
    assert_eq!(normalize("@weekly").unwrap(), "0 0 0 * * SUN");
    assert_eq!(normalize("@monthly").unwrap(), "0 0 0 1 * *");
    assert_eq!(normalize("@annually").unwrap(), normalize("@yearly").unwrap());
}

#[test]
fn test_weekday_numbers_become_names() {
    assert_eq!(
        normalize("30 9 * * 1-5").unwrap(),
        "0 30 9 * * MON,TUE,WED,THU,FRI"
    );
    assert_eq!(normalize("0 0 * * 0").unwrap(), "0 0 0 * * SUN");
    assert_eq!(normalize("0 0 * * 7").unwrap(), "0 0 0 * * SUN");
    assert_eq!(normalize("0 0 * * 0,6").unwrap(), "0 0 0 * * SUN,SAT");
    assert_eq!(normalize("0 0 * * */2").unwrap(), "0 0 0 * * SUN,TUE,THU,SAT");
    assert_eq!(normalize("0 0 * * 1/3").unwrap(), "0 0 0 * * MON,THU");
    assert_eq!(normalize("0 0 * * mon-wed").unwrap(), "0 0 0 * * MON,TUE,WED");
    assert_eq!(normalize("0 0 * * 5-7").unwrap(), "0 0 0 * * FRI,SAT,SUN");
}

#[test]
fn test_rejects_bad_expressions() {
    assert!(normalize("@every 5m").is_err());
    assert!(normalize("* * *").is_err());
    assert!(normalize("").is_err());
    assert!(normalize("0 0 * * 8").is_err());
    assert!(normalize("0 0 * * 5-1").is_err());
    assert!(normalize("0 0 * * */0").is_err());
    assert!(CronSchedule::parse("61 * * * *").is_err());
    assert!(CronSchedule::parse("not a cron").is_err());
}

#[test]
fn test_every_quarter_hour() {
    let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
    let next = schedule.next_after(&local(2024, 1, 1, 10, 7)).unwrap();
    assert_eq!((next.hour(), next.minute(), next.second()), (10, 15, 0));
}

#[test]
fn test_daily_fires_at_midnight() {
    let schedule = CronSchedule::parse("@daily").unwrap();
    let next = schedule.next_after(&local(2024, 1, 1, 10, 0)).unwrap();
    assert_eq!(next, local(2024, 1, 2, 0, 0));
}

#[test]
fn test_monday_means_monday() {
    // 2024-01-07 is a Sunday.
    let schedule = CronSchedule::parse("0 9 * * 1").unwrap();
    let next = schedule.next_after(&local(2024, 1, 7, 12, 0)).unwrap();
    assert_eq!(next.weekday(), Weekday::Mon);
    assert_eq!(next, local(2024, 1, 8, 9, 0));
}

#[test]
fn test_sunday_as_zero() {
    let schedule = CronSchedule::parse("0 3 * * 0").unwrap();
    let next = schedule.next_after(&local(2024, 1, 1, 0, 0)).unwrap();
    assert_eq!(next.weekday(), Weekday::Sun);
}

#[test]
fn test_expr_is_kept_as_written() {
    let schedule = CronSchedule::parse(" 0 2 * * * ").unwrap();
    assert_eq!(schedule.expr(), "0 2 * * *");
    assert!(schedule.next_fire().is_some());
}

#[test]
fn test_six_field_weekdays_use_standard_numbering() {
    assert_eq!(normalize("0 0 0 * * 1").unwrap(), "0 0 0 * * MON");
    assert_eq!(normalize("0 0 0 * * 0 2025").unwrap(), "0 0 0 * * SUN 2025");

    // 2024-01-01 is a Monday.
    let schedule = CronSchedule::parse("0 0 0 * * 1").unwrap();
    let next = schedule.next_after(&local(2024, 1, 1, 12, 0)).unwrap();
    assert_eq!(next, local(2024, 1, 8, 0, 0));
    assert!(normalize("0 0 0 * * 9").is_err());
}

#[test]
fn test_day_fields_split_only_when_both_restricted() {
    assert_eq!(split_day_fields("0 0 0 13 * FRI"), vec!["0 0 0 13 * *", "0 0 0 * * FRI"]);
    assert_eq!(split_day_fields("0 0 0 13 * *"), vec!["0 0 0 13 * *"]);
    assert_eq!(split_day_fields("0 0 0 * * FRI"), vec!["0 0 0 * * FRI"]);
    assert_eq!(split_day_fields("0 0 0 ? * MON"), vec!["0 0 0 ? * MON"]);
}

#[test]
fn test_day_of_month_or_weekday() {
    // The 13th or any Friday: 2024-01-05 is the first Friday of the year.
    let schedule = CronSchedule::parse("0 0 13 * 5").unwrap();
    let next = schedule.next_after(&local(2024, 1, 1, 12, 0)).unwrap();
    assert_eq!(next, local(2024, 1, 5, 0, 0));

    let after_friday = schedule.next_after(&local(2024, 1, 10, 0, 0)).unwrap();
    assert_eq!(after_friday, local(2024, 1, 12, 0, 0));
    let after_second_friday = schedule.next_after(&local(2024, 1, 12, 0, 0)).unwrap();
    assert_eq!(after_second_friday, local(2024, 1, 13, 0, 0));
}

#[test]
fn test_first_of_month_or_monday() {
    // 2024-02-01 is a Thursday; the next Monday is 2024-02-05.
    let schedule = CronSchedule::parse("30 4 1 * 1").unwrap();
    let next = schedule.next_after(&local(2024, 1, 31, 12, 0)).unwrap();
    assert_eq!(next, local(2024, 2, 1, 4, 30));
    let next = schedule.next_after(&next).unwrap();
    assert_eq!(next, local(2024, 2, 5, 4, 30));
}
