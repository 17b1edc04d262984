pub mod backdrop;
pub mod stage;
pub mod text_editor;
pub mod text_measure;

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::editor::Editor;

/// Shared editor handle passed down as a prop. Two handles are equal when
/// they point at the same editor.
#[derive(Clone)]
pub struct EditorHandle(pub Rc<RefCell<Editor>>);

impl PartialEq for EditorHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for EditorHandle {
    type Target = Rc<RefCell<Editor>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
