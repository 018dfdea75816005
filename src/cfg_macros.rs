#![allow(unused_macros)]

macro_rules! cfg_libpcap {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "libpcap")]
            $item
        )*
    }
}
