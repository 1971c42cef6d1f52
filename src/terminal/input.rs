use crate::{
    form::{Field, FieldKind, FieldState, FormController},
    page::{Event, FieldEdit},
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the application to do.
#[derive(Debug)]
pub(crate) enum Action {
    Dispatch(Event),
    Quit,
}

/// The control in the current section the user is interacting with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Cursor {
    /// Index of the focused control: a field of the section, or the submit button past them.
    pub(crate) control: usize,
    /// The highlighted option within a choice field.
    pub(crate) option: usize,
}

/// A control in a section.
pub(crate) enum Control<'a> {
    Field(&'a Field),
    Submit,
}

/// The controls of the section being shown, in display order.
pub(crate) fn controls(controller: &FormController) -> Vec<Control<'_>> {
    let Some(section) = controller.section() else {
        return Vec::new();
    };
    let mut controls: Vec<_> = section.fields.iter().map(Control::Field).collect();
    if controller.is_last_section() {
        controls.push(Control::Submit);
    }
    controls
}

impl Cursor {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Translate a key press into an action, moving the cursor as needed.
    pub(crate) fn handle_key(&mut self, key: KeyEvent, controller: &FormController, alert_open: bool) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let control_pressed = key.modifiers.contains(KeyModifiers::CONTROL);
        if control_pressed && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        if alert_open {
            return matches!(key.code, KeyCode::Enter | KeyCode::Esc).then_some(Action::Dispatch(Event::DismissAlert));
        }
        if controller.is_submitted() {
            return matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')).then_some(Action::Quit);
        }

        let controls = controls(controller);
        match (key.code, control_pressed) {
            (KeyCode::Esc, _) => Some(Action::Quit),
            (KeyCode::PageDown, _) | (KeyCode::Char('n'), true) => Some(Action::Dispatch(Event::Advance)),
            (KeyCode::PageUp, _) | (KeyCode::Char('p'), true) => Some(Action::Dispatch(Event::Retreat)),
            (KeyCode::Char('s'), true) => controller.is_last_section().then_some(Action::Dispatch(Event::Submit)),
            (KeyCode::Tab | KeyCode::Down, _) => {
                self.step(1, controls.len());
                None
            }
            (KeyCode::BackTab | KeyCode::Up, _) => {
                self.step(-1, controls.len());
                None
            }
            (_, true) => None,
            (code, false) => match controls.get(self.control)? {
                Control::Submit => (code == KeyCode::Enter).then_some(Action::Dispatch(Event::Submit)),
                Control::Field(field) => self.edit_field(code, field, controller, controls.len()),
            },
        }
    }

    fn step(&mut self, delta: isize, total: usize) {
        if total == 0 {
            return;
        }
        self.control = (self.control as isize + delta).rem_euclid(total as isize) as usize;
        self.option = 0;
    }

    fn edit_field(&mut self, code: KeyCode, field: &Field, controller: &FormController, total: usize) -> Option<Action> {
        let edit = |edit| Some(Action::Dispatch(Event::FieldEdited { field: field.name.clone(), edit }));
        match &field.kind {
            FieldKind::Text => {
                let Some(FieldState::Text(current)) = controller.field_state(&field.name) else {
                    return None;
                };
                let mut text = current.clone();
                match code {
                    KeyCode::Char(c) => text.push(c),
                    KeyCode::Backspace => {
                        text.pop()?;
                    }
                    KeyCode::Enter => {
                        self.step(1, total);
                        return None;
                    }
                    _ => return None,
                }
                edit(FieldEdit::SetText(text))
            }
            FieldKind::SingleChoice { options } | FieldKind::MultiChoice { options } => match code {
                KeyCode::Left => {
                    self.option = self.option.saturating_sub(1);
                    None
                }
                KeyCode::Right => {
                    self.option = (self.option + 1).min(options.len().saturating_sub(1));
                    None
                }
                KeyCode::Char(' ') | KeyCode::Enter => match field.kind {
                    FieldKind::SingleChoice { .. } => edit(FieldEdit::Choose(self.option)),
                    _ => edit(FieldEdit::Toggle(self.option)),
                },
                _ => None,
            },
            FieldKind::Slider { min, max, .. } => {
                let Some(FieldState::Slider(value)) = controller.field_state(&field.name) else {
                    return None;
                };
                let value = match code {
                    KeyCode::Left => value.saturating_sub(1),
                    KeyCode::Right => value.saturating_add(1),
                    KeyCode::Home => *min,
                    KeyCode::End => *max,
                    _ => return None,
                };
                Some(Action::Dispatch(Event::SliderChanged { field: field.name.clone(), value }))
            }
        }
    }
}
