//! Digit entry through the public oven API.

use megawave_core::{Button, MAX_DIGITS, Oven, Readout};

use crate::common::Harness;

/// Expected display after pressing `digits`: last four, zero-padded.
fn expected_display(digits: &[i32]) -> String {
    let mut slots = [0; 4];
    let tail = &digits[digits.len().saturating_sub(4)..];
    slots[4 - tail.len()..].copy_from_slice(tail);
    format!("{}{}:{}{}", slots[0], slots[1], slots[2], slots[3])
}

#[test]
fn display_is_last_digits_pressed() {
    let sequences: &[&[i32]] = &[
        &[0],
        &[9],
        &[4, 2],
        &[0, 0, 7],
        &[5, 9, 5, 9],
        &[9, 9, 9, 9],
        &[1, 0, 0, 0],
    ];
    for digits in sequences {
        let oven = Oven::new();
        for &d in *digits {
            oven.press_digit(d);
        }
        assert_eq!(oven.display(), expected_display(digits), "{digits:?}");
    }
}

#[test]
fn one_three_five() {
    let h = Harness::new();
    h.press(&[1, 3, 5]);

    assert_eq!(h.oven.display(), "01:35");
    assert_eq!(h.oven.readout().total_seconds(), 95);
    assert_eq!(h.take_shown(), ["00:01", "00:13", "01:35"]);
}

#[test]
fn capacity_cap_holds_display() {
    let h = Harness::new();

    h.press(&[1, 2, 3, 4]);
    assert_eq!(h.oven.display(), "12:34");

    h.oven.press_digit(5);
    assert_eq!(h.oven.display(), "12:34");
    h.oven.press_digit(6);
    assert_eq!(h.oven.display(), "12:34");

    assert_eq!(h.logs.count("max digits reached, display not updated"), 2);
    assert_eq!(h.take_shown().len(), usize::from(MAX_DIGITS));
}

#[test]
fn out_of_range_values_never_change_state() {
    let h = Harness::new();
    h.press(&[3]);

    for bad in [-100, -1, 10, 11, i32::MAX, i32::MIN] {
        h.oven.press_digit(bad);
        assert_eq!(h.oven.display(), "00:03", "after {bad}");
    }

    // A full entry still fits afterwards, so no slot was consumed.
    h.press(&[4, 5, 6]);
    assert_eq!(h.oven.display(), "34:56");
    assert_eq!(h.logs.count("invalid digit ignored"), 6);
    assert_eq!(h.metrics.button_presses(Button::Digit, false), 4);
}

#[test]
fn maximum_entry_is_ninety_nine_ninety_nine() {
    let h = Harness::new();
    h.press(&[9, 9, 9, 9]);

    assert_eq!(h.oven.readout(), Readout::SATURATED);
    assert_eq!(h.oven.readout().total_seconds(), 6039);
}

#[test]
fn logs_identify_each_press() {
    let h = Harness::new();
    h.press(&[7, 12]);

    let logs = h.logs.contents();
    assert!(logs.contains("digit pressed digit=7 cooking=false"));
    assert!(logs.contains("digit pressed digit=12 cooking=false"));
    assert!(logs.contains("display updated display=00:07 digit_count=1"));
    assert!(logs.contains("invalid digit ignored digit=12"));
}
