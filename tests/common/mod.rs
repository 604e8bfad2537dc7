/// Runs a `.lox` fixture either in-process (`OK`, comparing captured stdout
/// line-by-line) or out-of-process via the built binary (`ERR`, checking the
/// diagnostic text on stderr contains each expected fragment).
#[macro_export]
macro_rules! lox_tests {
    ($name:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $name() {
            let mut expected = vec![$($expected),*];
            let expected = match expected.len() {
                0 => String::new(),
                _ => {
                    expected.push("");
                    expected.join("\n")
                }
            };

            let path = format!("tests/fixtures/{}/{}.lox", stringify!($scope), stringify!($name));
            let source = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("reading fixture {path}: {e}"));

            let mut output = Vec::new();
            let (had_error, had_runtime_error) = {
                let mut lox = loxide::Lox::new(&mut output);
                lox.run(&source)
            };

            assert!(!had_error, "unexpected compile error running {path}");
            assert!(!had_runtime_error, "unexpected runtime error running {path}");
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($name:ident in $scope:ident is ERR $($expected:expr)+) => {
        #[test]
        fn $name() {
            use assert_cmd::Command;
            use predicates::str::contains;

            let path = format!("tests/fixtures/{}/{}.lox", stringify!($scope), stringify!($name));

            let mut cmd = Command::cargo_bin("loxide").unwrap();
            let mut assert = cmd.arg(&path).assert().failure();
            $(
                assert = assert.stderr(contains($expected));
            )+
            let _ = assert;
        }
    };
}
