//! Macros for declaring state and event sets.

/// Generate a fieldless enum and its [`State`](crate::core::State) implementation.
///
/// Variant order defines the state ids, so it must match the order states
/// are registered with the [`MachineBuilder`](crate::builder::MachineBuilder).
///
/// # Example
///
/// ```
/// use fsmpool::core::State;
/// use fsmpool::state_enum;
///
/// state_enum! {
///     pub enum MotorState {
///         Idle,
///         Stop,
///         Start,
///         ChangeSpeed,
///     }
/// }
///
/// assert_eq!(MotorState::COUNT, 4);
/// assert_eq!(MotorState::Start.id(), 2);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            const COUNT: usize = [$(stringify!($variant)),*].len();

            fn id(&self) -> usize {
                *self as usize
            }

            fn from_id(id: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),*];
                ALL.get(id).copied()
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

/// Generate a fieldless enum and its [`Event`](crate::core::Event) implementation.
///
/// # Example
///
/// ```
/// use fsmpool::core::Event;
/// use fsmpool::event_enum;
///
/// event_enum! {
///     pub enum MotorEvent {
///         SetSpeed,
///         Halt,
///     }
/// }
///
/// assert_eq!(MotorEvent::Halt.name(), "Halt");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Event for $name {
            const COUNT: usize = [$(stringify!($variant)),*].len();

            fn id(&self) -> usize {
                *self as usize
            }

            fn from_id(id: usize) -> Option<Self> {
                const ALL: &[$name] = &[$($name::$variant),*];
                ALL.get(id).copied()
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
