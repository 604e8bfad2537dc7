#[macro_use]
mod common;

#[cfg(test)]
mod logical {
    lox_tests! {
        short_circuit in logical is OK
        "false"
        "true"
        "and-evaluated"
        "true"
    }
}
