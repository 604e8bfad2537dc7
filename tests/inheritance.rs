#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    lox_tests! {
        super_call in inheritance is OK
        "Fry until golden brown."
        "Pipe full of custard and coat with chocolate."
    }

    lox_tests! {
        multi_level in inheritance is OK
        "A"
        "C"
    }

    lox_tests! {
        self_inherit in inheritance is ERR
        "A class can't inherit from itself."
    }

    lox_tests! {
        non_class_superclass in inheritance is ERR
        "Superclass must be a class."
    }
}
