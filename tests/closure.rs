#[macro_use]
mod common;

#[cfg(test)]
mod closure {
    lox_tests! {
        counter in closure is OK
        "1"
        "2"
        "3"
    }

    lox_tests! {
        nested in closure is OK
        "a"
        "b"
    }

    lox_tests! {
        independent_instances in closure is OK
        "1"
        "2"
        "1"
    }
}
