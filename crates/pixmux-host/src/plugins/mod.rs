//! Built-in content plugins.
//!
//! | Factory name | Type                         | Shows                          |
//! |--------------|------------------------------|--------------------------------|
//! | `test`       | [`test_pattern::TestPattern`] | four coloured quadrants       |
//! | `clock`      | [`clock::Clock`]             | `HH:MM[:SS]`, 3x5 pixel font   |
//! | `slideshow`  | [`slideshow::Slideshow`]     | image files in rotation        |
//! | `solid`      | [`solid::Solid`]             | one colour, optionally translucent |
//!
//! Each plugin exposes a `setup(ctx)` constructor that doubles as its
//! registry factory.

pub mod clock;
pub mod slideshow;
pub mod solid;
pub mod test_pattern;
pub mod ticker;

use pixmux_core::PluginRegistry;

/// Registry pre-populated with every built-in factory.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("test", test_pattern::TestPattern::setup);
    registry.register("clock", clock::Clock::setup);
    registry.register("slideshow", slideshow::Slideshow::setup);
    registry.register("solid", solid::Solid::setup);
    registry
}
