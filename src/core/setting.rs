//! Typed values carried by setting nodes.
//!
//! A command node built with a [`Setting`] prints its value when run without
//! arguments, assigns the joined arguments otherwise, and contributes its
//! value when the tree is serialized.

use std::any::Any;
use std::fmt;

/// Types that can back a setting.
///
/// Implemented for `bool`, `i32`, `i64`, `u32`, `f32`, `f64` and `String`.
pub trait SettingValue: Clone + PartialEq + Send + Sync + 'static {
    /// Parse a value from console input.
    fn parse(s: &str) -> Option<Self>;

    /// Format the value for output and serialization.
    fn format(&self) -> String;

    /// Clamp the value to min/max bounds if the type is ordered.
    fn clamp(self, _min: Option<&Self>, _max: Option<&Self>) -> Self {
        self
    }
}

impl SettingValue for bool {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "enable" => Some(true),
            "false" | "0" | "no" | "off" | "disable" => Some(false),
            _ => None,
        }
    }

    fn format(&self) -> String {
        self.to_string()
    }
}

impl SettingValue for String {
    fn parse(s: &str) -> Option<Self> {
        Some(s.to_string())
    }

    fn format(&self) -> String {
        self.clone()
    }
}

macro_rules! integer_setting {
    ($($ty:ty),*) => {$(
        impl SettingValue for $ty {
            fn parse(s: &str) -> Option<Self> {
                s.trim().parse().ok()
            }

            fn format(&self) -> String {
                self.to_string()
            }

            fn clamp(self, min: Option<&Self>, max: Option<&Self>) -> Self {
                let v = min.map_or(self, |&min| self.max(min));
                max.map_or(v, |&max| v.min(max))
            }
        }
    )*};
}

macro_rules! float_setting {
    ($($ty:ty),*) => {$(
        impl SettingValue for $ty {
            fn parse(s: &str) -> Option<Self> {
                s.trim().parse().ok().filter(|v: &$ty| v.is_finite())
            }

            fn format(&self) -> String {
                if self.fract() == 0.0 {
                    format!("{:.0}", self)
                } else {
                    self.to_string()
                }
            }

            fn clamp(self, min: Option<&Self>, max: Option<&Self>) -> Self {
                let v = min.map_or(self, |&min| self.max(min));
                max.map_or(v, |&max| v.min(max))
            }
        }
    )*};
}

integer_setting!(i32, i64, u32);
float_setting!(f32, f64);

/// A typed value with a default and optional bounds.
///
/// # Examples
///
/// ```
/// use bevy_command_tree::Setting;
///
/// let mut threshold = Setting::new(0i32).min(0).max(40);
/// threshold.set(55);
/// assert_eq!(threshold.get(), 40);
///
/// threshold.reset();
/// assert_eq!(threshold.get(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Setting<T: SettingValue> {
    value: T,
    default: T,
    min: Option<T>,
    max: Option<T>,
}

impl<T: SettingValue> Setting<T> {
    /// Create a setting holding its default value.
    pub fn new(default: T) -> Self {
        Self {
            value: default.clone(),
            default,
            min: None,
            max: None,
        }
    }

    /// Set the lower bound, re-clamping the current value.
    pub fn min(mut self, min: T) -> Self {
        self.min = Some(min);
        self.value = self.value.clone().clamp(self.min.as_ref(), self.max.as_ref());
        self
    }

    /// Set the upper bound, re-clamping the current value.
    pub fn max(mut self, max: T) -> Self {
        self.max = Some(max);
        self.value = self.value.clone().clamp(self.min.as_ref(), self.max.as_ref());
        self
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value.clone()
    }

    #[inline]
    pub fn get_ref(&self) -> &T {
        &self.value
    }

    /// Assign a value, applying the bounds.
    pub fn set(&mut self, value: T) {
        self.value = value.clamp(self.min.as_ref(), self.max.as_ref());
    }

    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.value != self.default
    }
}

/// Type-erased access to a [`Setting`], as stored on a command node.
pub trait SettingDyn: Send + Sync {
    /// Current value as a string.
    fn get_string(&self) -> String;

    /// Parse and assign a value. Returns `false` if it does not parse.
    fn set_string(&mut self, s: &str) -> bool;

    /// Default value as a string.
    fn default_string(&self) -> String;

    /// Restore the default value.
    fn reset(&mut self);

    /// Whether the current value differs from the default.
    fn is_modified(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: SettingValue> SettingDyn for Setting<T> {
    fn get_string(&self) -> String {
        self.value.format()
    }

    fn set_string(&mut self, s: &str) -> bool {
        match T::parse(s) {
            Some(value) => {
                self.set(value);
                true
            }
            None => false,
        }
    }

    fn default_string(&self) -> String {
        self.default.format()
    }

    fn reset(&mut self) {
        Setting::reset(self);
    }

    fn is_modified(&self) -> bool {
        Setting::is_modified(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for dyn SettingDyn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingDyn")
            .field("value", &self.get_string())
            .field("default", &self.default_string())
            .finish()
    }
}
