//! UI state flags
//!
//! Orthogonal to the lifecycle [`Phase`](crate::Phase): a component can be
//! disabled or hidden whether or not it is in the document.

use bitflags::bitflags;

use crate::events::event_type;

bitflags! {
    /// UI state bits. Combine with bitwise OR: `StateFlags::FOCUSED | StateFlags::ACTIVE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u16 {
        const NONE = 0;
        const DISABLED = 1 << 0;
        const HOVER = 1 << 1;
        const ACTIVE = 1 << 2;
        const SELECTED = 1 << 3;
        const CHECKED = 1 << 4;
        const FOCUSED = 1 << 5;
        const OPENED = 1 << 6;
        const HIGHLIGHTED = 1 << 7;
        const HIDDEN = 1 << 8;
    }
}

const TRANSITIONS: &[(StateFlags, &str, &str)] = &[
    (StateFlags::DISABLED, event_type::DISABLE, event_type::ENABLE),
    (StateFlags::HOVER, event_type::ENTER, event_type::LEAVE),
    (StateFlags::ACTIVE, event_type::ACTIVATE, event_type::DEACTIVATE),
    (StateFlags::SELECTED, event_type::SELECT, event_type::UNSELECT),
    (StateFlags::CHECKED, event_type::CHECK, event_type::UNCHECK),
    (StateFlags::FOCUSED, event_type::FOCUS, event_type::BLUR),
    (StateFlags::OPENED, event_type::OPEN, event_type::CLOSE),
    (StateFlags::HIGHLIGHTED, event_type::HIGHLIGHT, event_type::UNHIGHLIGHT),
    (StateFlags::HIDDEN, event_type::HIDE, event_type::SHOW),
];

impl StateFlags {
    /// Component event emitted when this single flag is switched on or off.
    /// `None` for empty or combined flags.
    pub fn transition_event(self, on: bool) -> Option<&'static str> {
        TRANSITIONS
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|&(_, set, cleared)| if on { set } else { cleared })
    }
}
