//! Numeric passphrase matching, one keypad character at a time.
//!
//! The matcher keeps a 1-based cursor pointing at the next expected digit. A
//! correct digit moves the cursor forward; the passphrase is complete once the
//! cursor steps past the last digit.
//!
//! With [`MismatchPolicy::Retain`] a wrong digit leaves the cursor where it
//! was, so `1 2 9 3 4` still unlocks `1234`. Installed units behave this way and
//! the default keeps it; [`MismatchPolicy::Restart`] is the strict alternative.

use core::fmt;

use crate::config::DEFAULT_PASSPHRASE;

/// How a wrong digit affects partial progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum MismatchPolicy {
    /// Wrong digits are ignored; progress is kept.
    #[default]
    Retain,
    /// Wrong digits send the cursor back to the first digit.
    Restart,
}

/// Reason a [`Passphrase`] was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PassphraseError {
    Empty,
    /// Text passphrase had the wrong number of characters.
    Length,
    NotADigit(char),
}

impl fmt::Display for PassphraseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassphraseError::Empty => f.write_str("passphrase must contain at least one digit"),
            PassphraseError::Length => f.write_str("passphrase has the wrong length"),
            PassphraseError::NotADigit(key) => write!(f, "passphrase character `{key}` is not a digit"),
        }
    }
}

/// Fixed-length sequence of decimal digits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Passphrase<const N: usize> {
    digits: [char; N],
}

impl<const N: usize> Passphrase<N> {
    pub const fn new(digits: [char; N]) -> Result<Self, PassphraseError> {
        if N == 0 {
            return Err(PassphraseError::Empty);
        }
        let mut index = 0;
        while index < N {
            if !digits[index].is_ascii_digit() {
                return Err(PassphraseError::NotADigit(digits[index]));
            }
            index += 1;
        }
        Ok(Self { digits })
    }

    pub const fn digits(&self) -> &[char; N] {
        &self.digits
    }
}

impl Passphrase<4> {
    /// Parses a four digit passphrase such as `"1234"`.
    pub fn parse4(text: &str) -> Result<Self, PassphraseError> {
        let mut digits = ['0'; 4];
        let mut chars = text.chars();
        for slot in &mut digits {
            *slot = chars.next().ok_or(PassphraseError::Length)?;
        }
        if chars.next().is_some() {
            return Err(PassphraseError::Length);
        }
        Self::new(digits)
    }
}

/// Factory passphrase, validated at compile time.
pub const FACTORY_PASSPHRASE: Passphrase<4> = match Passphrase::new(DEFAULT_PASSPHRASE) {
    Ok(passphrase) => passphrase,
    Err(_) => panic!("factory passphrase must be numeric"),
};

/// Outcome of feeding one key to the matcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MatchProgress {
    /// The key did not change progress.
    Ignored,
    /// The key matched the next digit.
    Advanced,
    /// The key was wrong and progress restarted.
    Restarted,
    /// The key completed the passphrase.
    Complete,
}

/// Tracks partial passphrase entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PassphraseMatcher<const N: usize> {
    expected: Passphrase<N>,
    cursor: usize,
    policy: MismatchPolicy,
}

impl<const N: usize> PassphraseMatcher<N> {
    pub const fn new(expected: Passphrase<N>, policy: MismatchPolicy) -> Self {
        Self {
            expected,
            cursor: 1,
            policy,
        }
    }

    /// 1-based index of the next expected digit; `N + 1` once complete.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn is_complete(&self) -> bool {
        self.cursor > N
    }

    pub const fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: MismatchPolicy) {
        self.policy = policy;
    }

    /// Returns to the first digit.
    pub fn reset(&mut self) {
        self.cursor = 1;
    }

    /// Feeds one keypad character.
    pub fn advance(&mut self, key: char) -> MatchProgress {
        if self.is_complete() {
            return MatchProgress::Complete;
        }

        if key == self.expected.digits[self.cursor - 1] {
            return self.step();
        }

        match self.policy {
            MismatchPolicy::Retain => MatchProgress::Ignored,
            MismatchPolicy::Restart => {
                let had_progress = self.cursor > 1;
                self.cursor = 1;
                if key == self.expected.digits[0] {
                    self.step()
                } else if had_progress {
                    MatchProgress::Restarted
                } else {
                    MatchProgress::Ignored
                }
            }
        }
    }

    fn step(&mut self) -> MatchProgress {
        self.cursor += 1;
        if self.is_complete() {
            MatchProgress::Complete
        } else {
            MatchProgress::Advanced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(policy: MismatchPolicy) -> PassphraseMatcher<4> {
        PassphraseMatcher::new(Passphrase::new(['1', '2', '3', '4']).unwrap(), policy)
    }

    fn feed(matcher: &mut PassphraseMatcher<4>, keys: &str) -> MatchProgress {
        let mut last = MatchProgress::Ignored;
        for key in keys.chars() {
            last = matcher.advance(key);
        }
        last
    }

    #[test]
    fn exact_sequence_completes() {
        let mut matcher = matcher(MismatchPolicy::Retain);
        assert_eq!(matcher.advance('1'), MatchProgress::Advanced);
        assert_eq!(matcher.advance('2'), MatchProgress::Advanced);
        assert_eq!(matcher.advance('3'), MatchProgress::Advanced);
        assert_eq!(matcher.cursor(), 4);
        assert_eq!(matcher.advance('4'), MatchProgress::Complete);
        assert_eq!(matcher.cursor(), 5);
    }

    #[test]
    fn retain_policy_keeps_progress_across_wrong_digits() {
        let mut matcher = matcher(MismatchPolicy::Retain);
        feed(&mut matcher, "12");
        assert_eq!(matcher.advance('9'), MatchProgress::Ignored);
        assert_eq!(matcher.cursor(), 3);
        assert_eq!(feed(&mut matcher, "34"), MatchProgress::Complete);
    }

    #[test]
    fn restart_policy_drops_progress() {
        let mut matcher = matcher(MismatchPolicy::Restart);
        feed(&mut matcher, "12");
        assert_eq!(matcher.advance('9'), MatchProgress::Restarted);
        assert_eq!(matcher.cursor(), 1);
        assert_eq!(feed(&mut matcher, "34"), MatchProgress::Ignored);
        assert_eq!(matcher.cursor(), 1);
    }

    #[test]
    fn restart_policy_retests_wrong_key_against_first_digit() {
        let mut matcher = matcher(MismatchPolicy::Restart);
        feed(&mut matcher, "12");
        assert_eq!(matcher.advance('1'), MatchProgress::Advanced);
        assert_eq!(matcher.cursor(), 2);
        assert_eq!(feed(&mut matcher, "234"), MatchProgress::Complete);
    }

    #[test]
    fn cursor_never_moves_backwards_without_reset() {
        let mut matcher = matcher(MismatchPolicy::Retain);
        let mut previous = matcher.cursor();
        for key in "91*2#83x0004".chars() {
            matcher.advance(key);
            assert!(matcher.cursor() >= previous);
            assert!((1..=5).contains(&matcher.cursor()));
            previous = matcher.cursor();
        }
        matcher.reset();
        assert_eq!(matcher.cursor(), 1);
    }

    #[test]
    fn passphrase_rejects_non_digits() {
        assert_eq!(
            Passphrase::new(['1', '#']),
            Err(PassphraseError::NotADigit('#'))
        );
        assert_eq!(Passphrase::<0>::new([]), Err(PassphraseError::Empty));
        assert_eq!(Passphrase::parse4("4321").map(|p| *p.digits()), Ok(['4', '3', '2', '1']));
        assert_eq!(Passphrase::parse4("123"), Err(PassphraseError::Length));
        assert_eq!(Passphrase::parse4("12345"), Err(PassphraseError::Length));
        assert_eq!(Passphrase::parse4("12a4"), Err(PassphraseError::NotADigit('a')));
    }
}
