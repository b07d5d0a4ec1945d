#[cfg(not(feature = "debug-checks"))]
pub(crate) const SQUASH_ASSERT_LEVEL_DEFINITION: u8 = SQUASH_ASSERT_SIMPLE;
#[cfg(feature = "debug-checks")]
pub(crate) const SQUASH_ASSERT_LEVEL_DEFINITION: u8 = SQUASH_ASSERT_EXTREME;

pub(crate) const SQUASH_ASSERT_SIMPLE: u8 = 1;
pub(crate) const SQUASH_ASSERT_MODERATE: u8 = 2;
pub(crate) const SQUASH_ASSERT_ADVANCED: u8 = 3;
pub(crate) const SQUASH_ASSERT_EXTREME: u8 = 4;

macro_rules! print_squash_assert_warning_message {
    () => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_MODERATE {
            log::warn!("Potential performance degradation: the Squash assert level is set to {}, meaning many debug asserts are active which may result in performance degradation.", $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION);
        };
    };
}

macro_rules! squash_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

macro_rules! squash_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

macro_rules! squash_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

macro_rules! squash_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

macro_rules! squash_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::SQUASH_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SQUASH_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}

pub(crate) use print_squash_assert_warning_message;
pub(crate) use squash_assert_advanced;
pub(crate) use squash_assert_eq_simple;
pub(crate) use squash_assert_extreme;
pub(crate) use squash_assert_moderate;
pub(crate) use squash_assert_simple;
