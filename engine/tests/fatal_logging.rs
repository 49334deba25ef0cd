//! Misuse is logged at error level before the panic. Kept in its own test binary since the
//! logger is process-wide.
use std::panic;

use log::{Level, LevelFilter};
use rusty_ecs::ecs::Registry;

#[test]
fn double_add_is_logged_before_panicking() {
    // Given
    let logs = rusty_ecs::log::init(Level::Info).unwrap();
    assert_eq!(log::max_level(), LevelFilter::Info);
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.add_component(entity, 1u32);

    // When
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        registry.add_component(entity, 2u32);
    }));

    // Then
    assert!(result.is_err());
    let messages: Vec<_> = logs.try_iter().collect();
    // Pool creation logs at debug, which is above the installed level.
    assert!(messages.iter().all(|message| message.level <= Level::Info));
    let errors: Vec<_> = messages
        .into_iter()
        .filter(|message| message.level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        format!("entity {entity} already has component u32")
    );
}
