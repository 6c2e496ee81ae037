use crate::core::input::{EditOutcome, Key, LineEditor};
use crate::core::Prompter;
use crate::domain::credentials::SecureString;
use crate::utils::error::{DeployError, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::Write;

/// 在終端機上逐鍵讀取輸入
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }

    fn read_keys(&self, label: &str, masked: bool) -> Result<LineEditor> {
        println!("{} : ", label);

        let mut editor = LineEditor::new(masked);
        let mut stdout = std::io::stdout();
        {
            let _raw = RawModeGuard::enable()?;
            loop {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                // Windows 也會送出放開按鍵的事件
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                let key = match key.code {
                    KeyCode::Enter => Key::Enter,
                    KeyCode::Backspace => Key::Backspace,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Key::Cancel
                    }
                    KeyCode::Char(c) => Key::Char(c),
                    _ => Key::Other,
                };

                match editor.handle(key) {
                    EditOutcome::Echo(c) => write!(stdout, "{}", c)?,
                    EditOutcome::Erase => write!(stdout, "\x08 \x08")?,
                    EditOutcome::Ignored => continue,
                    EditOutcome::Done => break,
                    EditOutcome::Cancelled => {
                        drop(_raw);
                        println!();
                        return Err(DeployError::InputError {
                            message: "input cancelled".to_string(),
                        });
                    }
                }
                stdout.flush()?;
            }
        }
        println!();
        Ok(editor)
    }
}

impl Prompter for ConsolePrompter {
    fn read_line(&self, label: &str) -> Result<String> {
        Ok(self.read_keys(label, false)?.into_string())
    }

    fn read_secret(&self, label: &str) -> Result<SecureString> {
        Ok(self.read_keys(label, true)?.into_secret())
    }

    fn pause(&self, message: &str) -> Result<()> {
        println!("{}", message);
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(())
    }
}

/// 離開作用域時一定關閉 raw mode
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
