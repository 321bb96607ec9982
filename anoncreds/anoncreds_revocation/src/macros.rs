/// Masks secret material in log output outside of tests.
#[cfg(test)]
macro_rules! secret {
    ($val:expr) => {{
        $val
    }};
}

#[cfg(not(test))]
macro_rules! secret {
    ($val:expr) => {{
        "_"
    }};
}
