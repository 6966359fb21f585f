//! Assertion helpers.
//!
//! Each helper takes the reporter first, checks one condition, and on a
//! mismatch calls [`Reporter::fail`] with a one-line message. Whether that
//! aborts the test depends on the reporter: a plain
//! [`TestUnit`](crate::unit::TestUnit) stops the body, a
//! [`Relaxed`](crate::relaxed::Relaxed) wrapper records and continues.
//!
//! Messages are deliberately terse; attach context with
//! [`debug`](crate::debug::debug) when a failure needs explaining.

use std::fmt::{Debug, Display};

use difference::{Changeset, Difference};

use crate::reporter::Reporter;

/// Fails if `want != got`.
pub fn equal<R, T>(t: &R, want: T, got: T)
where
    R: Reporter + ?Sized,
    T: PartialEq + Debug,
{
    t.helper();
    if want != got {
        t.fail(&format!("want: {:?}; got: {:?}", want, got));
    }
}

/// Fails if `got == bad`.
pub fn not_equal<R, T>(t: &R, bad: T, got: T)
where
    R: Reporter + ?Sized,
    T: PartialEq + Debug,
{
    t.helper();
    if got == bad {
        t.fail(&format!("got: {:?}", got));
    }
}

/// Fails if the slices differ in length or in any element.
pub fn all_equal<R, T>(t: &R, want: &[T], got: &[T])
where
    R: Reporter + ?Sized,
    T: PartialEq + Debug,
{
    t.helper();
    if want != got {
        t.fail(&format!("want: {:?}; got: {:?}", want, got));
    }
}

/// Fails if `want` and `got` differ anywhere in their structure.
///
/// `None` and `Some(vec![])` are different values and fail here. When the
/// pretty-printed forms span several lines, a line diff follows the summary.
pub fn deep_equal<R, T>(t: &R, want: T, got: T)
where
    R: Reporter + ?Sized,
    T: PartialEq + Debug,
{
    t.helper();
    if want == got {
        return;
    }
    let mut message = format!("deep_equal({:?}, {:?}) == false", want, got);
    let (pretty_want, pretty_got) = (format!("{:#?}", want), format!("{:#?}", got));
    if pretty_want.contains('\n') || pretty_got.contains('\n') {
        message.push('\n');
        message.push_str(&render_diff(&pretty_want, &pretty_got));
    }
    t.fail(&message);
}

/// Fails unless `value` equals `T::default()`.
pub fn zero<R, T>(t: &R, value: T)
where
    R: Reporter + ?Sized,
    T: Default + PartialEq + Debug,
{
    t.helper();
    if value != T::default() {
        t.fail(&format!("got: {:?}", value));
    }
}

/// Fails if `value` equals `T::default()`.
pub fn not_zero<R, T>(t: &R, value: T)
where
    R: Reporter + ?Sized,
    T: Default + PartialEq + Debug,
{
    t.helper();
    if value == T::default() {
        t.fail(&format!("got: {:?}", value));
    }
}

/// Fails if `value` is `Some`.
pub fn none<R, T>(t: &R, value: &Option<T>)
where
    R: Reporter + ?Sized,
    T: Debug,
{
    t.helper();
    if let Some(v) = value {
        t.fail(&format!("got: {:?}", v));
    }
}

/// Fails if `value` is `None`.
pub fn some<R, T>(t: &R, value: &Option<T>)
where
    R: Reporter + ?Sized,
{
    t.helper();
    if value.is_none() {
        t.fail("got: None");
    }
}

/// Fails if `result` is an error.
pub fn ok<R, T, E>(t: &R, result: &Result<T, E>)
where
    R: Reporter + ?Sized,
    E: Display,
{
    t.helper();
    if let Err(err) = result {
        t.fail(&format!("got: {}", err));
    }
}

pub fn is_true<R: Reporter + ?Sized>(t: &R, value: bool) {
    t.helper();
    if !value {
        t.fail("got: false");
    }
}

pub fn is_false<R: Reporter + ?Sized>(t: &R, value: bool) {
    t.helper();
    if value {
        t.fail("got: true");
    }
}

/// Something a needle of type `N` can be searched for in.
///
/// Strings match any `Display` needle as a substring, byte slices match a
/// contiguous byte run, and other slices match by element.
pub trait Haystack<N: ?Sized> {
    /// Whether `needle` occurs, with a message describing the result.
    fn find(&self, needle: &N) -> (String, bool);
}

fn find_in_str(haystack: &str, needle: &dyn Display) -> (String, bool) {
    let needle = needle.to_string();
    if haystack.contains(needle.as_str()) {
        (format!("{:?} in {:?}", needle, haystack), true)
    } else {
        (format!("{:?} not in {:?}", needle, haystack), false)
    }
}

fn find_in_bytes(haystack: &[u8], needle: &[u8]) -> (String, bool) {
    let found = needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle);
    let (needle, haystack) = (
        String::from_utf8_lossy(needle),
        String::from_utf8_lossy(haystack),
    );
    if found {
        (format!("{:?} in {:?}", needle, haystack), true)
    } else {
        (format!("{:?} not in {:?}", needle, haystack), false)
    }
}

fn find_in_slice<T: PartialEq + Debug>(haystack: &[T], needle: &T) -> (String, bool) {
    if haystack.contains(needle) {
        (format!("{:?} in {:?}", needle, haystack), true)
    } else {
        (format!("{:?} not in {:?}", needle, haystack), false)
    }
}

impl<N: Display + ?Sized> Haystack<N> for str {
    fn find(&self, needle: &N) -> (String, bool) {
        find_in_str(self, &needle)
    }
}

impl<N: Display + ?Sized> Haystack<N> for String {
    fn find(&self, needle: &N) -> (String, bool) {
        find_in_str(self, &needle)
    }
}

impl Haystack<[u8]> for [u8] {
    fn find(&self, needle: &[u8]) -> (String, bool) {
        find_in_bytes(self, needle)
    }
}

impl Haystack<str> for [u8] {
    fn find(&self, needle: &str) -> (String, bool) {
        find_in_bytes(self, needle.as_bytes())
    }
}

impl<T: PartialEq + Debug> Haystack<T> for [T] {
    fn find(&self, needle: &T) -> (String, bool) {
        find_in_slice(self, needle)
    }
}

impl<T: PartialEq + Debug> Haystack<T> for Vec<T> {
    fn find(&self, needle: &T) -> (String, bool) {
        find_in_slice(self, needle)
    }
}

impl<T: PartialEq + Debug, const LEN: usize> Haystack<T> for [T; LEN] {
    fn find(&self, needle: &T) -> (String, bool) {
        find_in_slice(self, needle)
    }
}

/// Fails unless `needle` occurs in `haystack`.
pub fn contains<R, H, N>(t: &R, haystack: &H, needle: &N)
where
    R: Reporter + ?Sized,
    H: Haystack<N> + ?Sized,
    N: ?Sized,
{
    t.helper();
    let (message, found) = haystack.find(needle);
    if !found {
        t.fail(&message);
    }
}

/// Fails if `needle` occurs in `haystack`.
pub fn not_contains<R, H, N>(t: &R, haystack: &H, needle: &N)
where
    R: Reporter + ?Sized,
    H: Haystack<N> + ?Sized,
    N: ?Sized,
{
    t.helper();
    let (message, found) = haystack.find(needle);
    if found {
        t.fail(&message);
    }
}

fn render_diff(want: &str, got: &str) -> String {
    let changeset = Changeset::new(want, got, "\n");
    let mut lines = Vec::new();
    for diff in &changeset.diffs {
        let (marker, text) = match diff {
            Difference::Same(x) => (' ', x),
            Difference::Rem(x) => ('-', x),
            Difference::Add(x) => ('+', x),
        };
        for line in text.lines() {
            lines.push(format!("{}{}", marker, line));
        }
    }
    lines.join("\n")
}
