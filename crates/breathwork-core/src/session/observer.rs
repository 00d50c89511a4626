use super::display::DisplayState;
use crate::visuals::VisualFrame;

/// Presentation-side consumer of a session's outputs.
///
/// Two cadences: [`on_visuals`](Self::on_visuals) runs on every non-paused
/// frame, [`on_display`](Self::on_display) only when the whole-second
/// countdown changes.
pub trait SessionObserver {
    fn on_visuals(&mut self, _frame: &VisualFrame) {}

    fn on_display(&mut self, _state: &DisplayState) {}

    /// Invoked exactly once, when the countdown reaches zero.
    fn on_complete(&mut self) {}

    /// The session was torn down; animate targets back to `rest` and let go of them.
    fn on_release(&mut self, _rest: &VisualFrame) {}
}

impl SessionObserver for () {}

impl<T: SessionObserver + ?Sized> SessionObserver for &mut T {
    fn on_visuals(&mut self, frame: &VisualFrame) {
        (**self).on_visuals(frame);
    }

    fn on_display(&mut self, state: &DisplayState) {
        (**self).on_display(state);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }

    fn on_release(&mut self, rest: &VisualFrame) {
        (**self).on_release(rest);
    }
}

impl<T: SessionObserver + ?Sized> SessionObserver for Box<T> {
    fn on_visuals(&mut self, frame: &VisualFrame) {
        (**self).on_visuals(frame);
    }

    fn on_display(&mut self, state: &DisplayState) {
        (**self).on_display(state);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }

    fn on_release(&mut self, rest: &VisualFrame) {
        (**self).on_release(rest);
    }
}
