//! Key translation: crossterm key events to reader events.
//!
//! Stateless bindings plus one piece of state, the go-to-page prompt. While
//! the prompt is open every key edits the prompt except `Ctrl-C`.

use core_events::{Event, ReaderCommand};
use core_model::PageNumber;
use crossterm::event::{KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers as CKeyModifiers};

/// More digits than any source has pages.
const PROMPT_MAX_DIGITS: usize = 5;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyTranslator {
    prompt: Option<String>,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Translate one key press. Usually yields zero or one event; submitting
    /// the prompt yields the prompt close followed by the jump.
    pub fn translate(&mut self, key: &CKeyEvent) -> Vec<Event> {
        if key.code == CKeyCode::Char('c') && key.modifiers.contains(CKeyModifiers::CONTROL) {
            let mut out = Vec::with_capacity(2);
            if self.prompt.take().is_some() {
                out.push(Event::Prompt(None));
            }
            out.push(Event::Command(ReaderCommand::Quit));
            return out;
        }
        if self.prompt.is_some() {
            return self.edit_prompt(key.code);
        }
        match key.code {
            CKeyCode::Down | CKeyCode::Right | CKeyCode::PageDown | CKeyCode::Char(' ') => {
                vec![Event::Command(ReaderCommand::NextPage)]
            }
            CKeyCode::Up | CKeyCode::Left | CKeyCode::PageUp => {
                vec![Event::Command(ReaderCommand::PreviousPage)]
            }
            CKeyCode::Char('v') => vec![Event::Command(ReaderCommand::ToggleVisraam)],
            CKeyCode::Char('p') => vec![Event::Command(ReaderCommand::TogglePageNumber)],
            CKeyCode::Char('h') => vec![Event::Command(ReaderCommand::ToggleHelp)],
            CKeyCode::Char('q') => vec![Event::Command(ReaderCommand::Quit)],
            CKeyCode::Char('g') => {
                self.prompt = Some(String::new());
                vec![Event::Prompt(Some(String::new()))]
            }
            _ => Vec::new(),
        }
    }

    fn edit_prompt(&mut self, code: CKeyCode) -> Vec<Event> {
        let Some(digits) = self.prompt.as_mut() else {
            return Vec::new();
        };
        match code {
            CKeyCode::Char(c) if c.is_ascii_digit() => {
                if digits.len() >= PROMPT_MAX_DIGITS {
                    return Vec::new();
                }
                digits.push(c);
            }
            CKeyCode::Backspace => {
                if digits.pop().is_none() {
                    return Vec::new();
                }
            }
            CKeyCode::Esc => {
                self.prompt = None;
                return vec![Event::Prompt(None)];
            }
            CKeyCode::Enter => {
                let page = digits.parse::<PageNumber>().ok().filter(|page| *page > 0);
                self.prompt = None;
                let mut out = vec![Event::Prompt(None)];
                if let Some(page) = page {
                    out.push(Event::Command(ReaderCommand::GotoPage(page)));
                }
                return out;
            }
            _ => return Vec::new(),
        }
        vec![Event::Prompt(Some(digits.clone()))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: CKeyCode) -> CKeyEvent {
        CKeyEvent::new(code, CKeyModifiers::NONE)
    }

    fn feed(translator: &mut KeyTranslator, codes: &[CKeyCode]) -> Vec<Event> {
        codes
            .iter()
            .flat_map(|code| translator.translate(&press(*code)))
            .collect()
    }

    #[test]
    fn navigation_bindings() {
        let mut t = KeyTranslator::new();
        for code in [CKeyCode::Down, CKeyCode::Right, CKeyCode::PageDown, CKeyCode::Char(' ')] {
            assert_eq!(t.translate(&press(code)), vec![Event::Command(ReaderCommand::NextPage)]);
        }
        for code in [CKeyCode::Up, CKeyCode::Left, CKeyCode::PageUp] {
            assert_eq!(
                t.translate(&press(code)),
                vec![Event::Command(ReaderCommand::PreviousPage)]
            );
        }
        assert!(t.translate(&press(CKeyCode::Char('x'))).is_empty());
    }

    #[test]
    fn toggles_and_quit() {
        let mut t = KeyTranslator::new();
        assert_eq!(
            feed(&mut t, &[CKeyCode::Char('v'), CKeyCode::Char('p'), CKeyCode::Char('q')]),
            vec![
                Event::Command(ReaderCommand::ToggleVisraam),
                Event::Command(ReaderCommand::TogglePageNumber),
                Event::Command(ReaderCommand::Quit),
            ]
        );
        let ctrl_c = CKeyEvent::new(CKeyCode::Char('c'), CKeyModifiers::CONTROL);
        assert_eq!(t.translate(&ctrl_c), vec![Event::Command(ReaderCommand::Quit)]);
    }

    #[test]
    fn help_key_toggles_overlay() {
        let mut t = KeyTranslator::new();
        assert_eq!(
            feed(&mut t, &[CKeyCode::Char('h'), CKeyCode::Char('h')]),
            vec![
                Event::Command(ReaderCommand::ToggleHelp),
                Event::Command(ReaderCommand::ToggleHelp),
            ]
        );
        t.translate(&press(CKeyCode::Char('g')));
        assert!(t.translate(&press(CKeyCode::Char('h'))).is_empty());
    }

    #[test]
    fn prompt_collects_digits_and_submits() {
        let mut t = KeyTranslator::new();
        let events = feed(
            &mut t,
            &[
                CKeyCode::Char('g'),
                CKeyCode::Char('1'),
                CKeyCode::Char('x'),
                CKeyCode::Char('2'),
                CKeyCode::Backspace,
                CKeyCode::Char('4'),
                CKeyCode::Enter,
            ],
        );
        assert_eq!(
            events,
            vec![
                Event::Prompt(Some(String::new())),
                Event::Prompt(Some("1".into())),
                Event::Prompt(Some("12".into())),
                Event::Prompt(Some("1".into())),
                Event::Prompt(Some("14".into())),
                Event::Prompt(None),
                Event::Command(ReaderCommand::GotoPage(14)),
            ]
        );
        assert_eq!(t.prompt(), None);
    }

    #[test]
    fn prompt_swallows_navigation_keys() {
        let mut t = KeyTranslator::new();
        t.translate(&press(CKeyCode::Char('g')));
        assert!(t.translate(&press(CKeyCode::Down)).is_empty());
        assert!(t.translate(&press(CKeyCode::Char('q'))).is_empty());
        assert_eq!(t.prompt(), Some(""));
    }

    #[test]
    fn zero_or_empty_submission_only_closes() {
        let mut t = KeyTranslator::new();
        assert_eq!(
            feed(&mut t, &[CKeyCode::Char('g'), CKeyCode::Enter]),
            vec![Event::Prompt(Some(String::new())), Event::Prompt(None)]
        );
        let events = feed(&mut t, &[CKeyCode::Char('g'), CKeyCode::Char('0'), CKeyCode::Enter]);
        assert_eq!(events.last(), Some(&Event::Prompt(None)));
    }

    #[test]
    fn escape_cancels_and_digits_are_capped() {
        let mut t = KeyTranslator::new();
        t.translate(&press(CKeyCode::Char('g')));
        for _ in 0..8 {
            t.translate(&press(CKeyCode::Char('9')));
        }
        assert_eq!(t.prompt(), Some("99999"));
        assert_eq!(t.translate(&press(CKeyCode::Esc)), vec![Event::Prompt(None)]);
        assert_eq!(t.prompt(), None);
    }

    #[test]
    fn ctrl_c_closes_prompt_then_quits() {
        let mut t = KeyTranslator::new();
        t.translate(&press(CKeyCode::Char('g')));
        let ctrl_c = CKeyEvent::new(CKeyCode::Char('c'), CKeyModifiers::CONTROL);
        assert_eq!(
            t.translate(&ctrl_c),
            vec![Event::Prompt(None), Event::Command(ReaderCommand::Quit)]
        );
    }
}
