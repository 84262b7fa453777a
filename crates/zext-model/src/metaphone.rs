//! Metaphone phonetic keys
//!
//! A self-contained implementation of Lawrence Philips' original metaphone
//! (consonant skeleton) algorithm, used to suggest "did you mean" method names.
//! Non-ASCII-alphabetic characters are ignored.

const SH: char = 'X';
const TH: char = '0';

fn is_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'I' | 'O' | 'U')
}

/// E, I, Y soften a preceding C or G
fn makes_soft(c: char) -> bool {
    matches!(c, 'E' | 'I' | 'Y')
}

/// Letters before GH that keep it silent
fn no_gh_to_f(c: char) -> bool {
    matches!(c, 'B' | 'D' | 'H')
}

/// Letters that make a following H silent
fn affects_h(c: char) -> bool {
    matches!(c, 'C' | 'G' | 'P' | 'S' | 'T')
}

struct Word {
    letters: Vec<char>,
}

impl Word {
    fn at(&self, idx: isize) -> char {
        if idx < 0 {
            return '\0';
        }
        self.letters
            .get(idx as usize)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('\0')
    }

    /// Letter `n` positions ahead, or NUL if the word ends first
    fn ahead(&self, idx: isize, n: isize) -> char {
        for step in 1..n {
            if self.at(idx + step) == '\0' {
                return '\0';
            }
        }
        self.at(idx + n)
    }
}

/// Compute the metaphone key of `word`
pub fn metaphone(word: &str) -> String {
    let word = Word {
        letters: word.chars().collect(),
    };
    let mut key = String::new();

    // Skip leading non-letters
    let mut idx: isize = 0;
    while !word.at(idx).is_ascii_alphabetic() {
        if word.at(idx) == '\0' {
            return key;
        }
        idx += 1;
    }

    let current = word.at(idx);
    let next = word.at(idx + 1);
    match current {
        'A' => {
            if next == 'E' {
                key.push('E');
                idx += 2;
            } else {
                key.push('A');
                idx += 1;
            }
        }
        'G' | 'K' | 'P' => {
            if next == 'N' {
                key.push('N');
                idx += 2;
            }
        }
        'W' => {
            if next == 'R' {
                key.push('R');
                idx += 2;
            } else if next == 'H' || is_vowel(next) {
                key.push('W');
                idx += 2;
            }
        }
        'X' => {
            key.push('S');
            idx += 1;
        }
        'E' | 'I' | 'O' | 'U' => {
            key.push(current);
            idx += 1;
        }
        _ => {}
    }

    while word.at(idx) != '\0' {
        let current = word.at(idx);
        let last = word.at(idx - 1);
        let next = word.at(idx + 1);
        let after = if next != '\0' { word.at(idx + 2) } else { '\0' };
        let mut skip = 0;

        if !current.is_ascii_alphabetic() || (current == last && current != 'C') {
            idx += 1;
            continue;
        }

        match current {
            'B' => {
                if !(last == 'M' && next == '\0') {
                    key.push('B');
                }
            }
            'C' => {
                if makes_soft(next) {
                    if next == 'I' && after == 'A' {
                        key.push(SH);
                    } else if last != 'S' {
                        key.push('S');
                    }
                } else if next == 'H' {
                    key.push(SH);
                    skip += 1;
                } else {
                    key.push('K');
                }
            }
            'D' => {
                if next == 'G' && makes_soft(after) {
                    key.push('J');
                    skip += 1;
                } else {
                    key.push('T');
                }
            }
            'G' => {
                if next == 'H' {
                    if !(no_gh_to_f(word.at(idx - 3)) || word.at(idx - 4) == 'H') {
                        key.push('F');
                        skip += 1;
                    }
                } else if next == 'N' {
                    let at_break = !after.is_ascii_alphabetic();
                    if !(at_break || (after == 'E' && word.ahead(idx, 3) == 'D')) {
                        key.push('K');
                    }
                } else if makes_soft(next) && last != 'G' {
                    key.push('J');
                } else {
                    key.push('K');
                }
            }
            'H' => {
                if is_vowel(next) && !affects_h(last) {
                    key.push('H');
                }
            }
            'K' => {
                if last != 'C' {
                    key.push('K');
                }
            }
            'P' => {
                if next == 'H' {
                    key.push('F');
                } else {
                    key.push('P');
                }
            }
            'Q' => key.push('K'),
            'S' => {
                if next == 'I' && (after == 'O' || after == 'A') {
                    key.push(SH);
                } else if next == 'H' {
                    key.push(SH);
                    skip += 1;
                } else {
                    key.push('S');
                }
            }
            'T' => {
                if next == 'I' && (after == 'O' || after == 'A') {
                    key.push(SH);
                } else if next == 'H' {
                    key.push(TH);
                    skip += 1;
                } else if !(next == 'C' && after == 'H') {
                    key.push('T');
                }
            }
            'V' => key.push('F'),
            'W' => {
                if is_vowel(next) {
                    key.push('W');
                }
            }
            'X' => {
                key.push('K');
                key.push('S');
            }
            'Y' => {
                if is_vowel(next) {
                    key.push('Y');
                }
            }
            'Z' => key.push('S'),
            'F' | 'J' | 'L' | 'M' | 'N' | 'R' => key.push(current),
            // Vowels after the first letter
            _ => {}
        }

        idx += 1 + skip;
    }

    key
}
