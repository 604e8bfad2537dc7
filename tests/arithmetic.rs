#[macro_use]
mod common;

#[cfg(test)]
mod arithmetic {
    lox_tests! {
        basic in arithmetic is OK
        "7"
        "9"
        "2.5"
        "foobar"
    }

    lox_tests! {
        comparisons in arithmetic is OK
        "true"
        "true"
        "false"
        "true"
        "true"
        "true"
    }
}
