#[macro_use]
mod common;

#[cfg(test)]
mod resolver {
    lox_tests! {
        shadow_in_block in resolver is OK
        "inner"
        "outer"
        "global"
    }

    lox_tests! {
        reassignment in resolver is OK
        "3"
    }

    lox_tests! {
        shadowing_closure in resolver is OK
        "global"
        "global"
    }

    lox_tests! {
        self_reference_in_initializer in resolver is ERR
        "Can't read local variable in its own initializer."
    }

    lox_tests! {
        duplicate_local in resolver is ERR
        "Already a variable with this name in this scope."
    }

    lox_tests! {
        return_outside_function in resolver is ERR
        "Can't return from top-level code."
    }
}
