#[macro_use]
mod common;

#[cfg(test)]
mod class {
    lox_tests! {
        methods_and_fields in class is OK
        "A plain bagel"
        "A everything bagel"
    }

    lox_tests! {
        stringify in class is OK
        "<Foo>"
        "<instance of Foo>"
    }

    lox_tests! {
        undefined_property in class is ERR
        "Undefined property 'bar'."
    }

    lox_tests! {
        arity_mismatch in class is ERR
        "Expected 2 arguments but got 1."
    }
}
