use enum_assoc::Assoc;

/// A single entry in the hard-coded table of built-in runtime functions
/// (§4.2). There is no separate module table: a module "exists" iff at
/// least one entry's qualified name starts with its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Assoc)]
#[func(pub const fn qualified_name(&self) -> &'static str)]
#[func(pub const fn c_symbol(&self) -> &'static str)]
#[func(pub const fn return_type(&self) -> &'static str)]
#[func(pub const fn param_types(&self) -> &'static [&'static str])]
pub enum BuiltinFunction {
    #[assoc(qualified_name = "core::io::print")]
    #[assoc(c_symbol = "echo_print_string")]
    #[assoc(return_type = "void")]
    #[assoc(param_types = &["string"])]
    IoPrint,

    #[assoc(qualified_name = "core::io::println")]
    #[assoc(c_symbol = "echo_println_string")]
    #[assoc(return_type = "void")]
    #[assoc(param_types = &["string"])]
    IoPrintln,

    #[assoc(qualified_name = "core::io::print_i32")]
    #[assoc(c_symbol = "echo_print_i32")]
    #[assoc(return_type = "void")]
    #[assoc(param_types = &["i32"])]
    IoPrintI32,

    #[assoc(qualified_name = "core::io::print_f64")]
    #[assoc(c_symbol = "echo_print_f64")]
    #[assoc(return_type = "void")]
    #[assoc(param_types = &["f64"])]
    IoPrintF64,

    #[assoc(qualified_name = "core::io::read_line")]
    #[assoc(c_symbol = "echo_read_line")]
    #[assoc(return_type = "string")]
    #[assoc(param_types = &[])]
    IoReadLine,

    #[assoc(qualified_name = "core::mem::alloc")]
    #[assoc(c_symbol = "echo_alloc")]
    #[assoc(return_type = "i64")]
    #[assoc(param_types = &["i64"])]
    MemAlloc,

    #[assoc(qualified_name = "core::mem::free")]
    #[assoc(c_symbol = "echo_free")]
    #[assoc(return_type = "void")]
    #[assoc(param_types = &["i64"])]
    MemFree,

    #[assoc(qualified_name = "core::str::len")]
    #[assoc(c_symbol = "echo_str_len")]
    #[assoc(return_type = "i32")]
    #[assoc(param_types = &["string"])]
    StrLen,

    #[assoc(qualified_name = "core::str::concat")]
    #[assoc(c_symbol = "echo_str_concat")]
    #[assoc(return_type = "string")]
    #[assoc(param_types = &["string", "string"])]
    StrConcat,

    #[assoc(qualified_name = "core::math::sqrt")]
    #[assoc(c_symbol = "echo_sqrt")]
    #[assoc(return_type = "f64")]
    #[assoc(param_types = &["f64"])]
    MathSqrt,

    #[assoc(qualified_name = "core::math::abs")]
    #[assoc(c_symbol = "echo_abs_f64")]
    #[assoc(return_type = "f64")]
    #[assoc(param_types = &["f64"])]
    MathAbs,
}

pub static BUILTIN_FUNCTIONS: &[BuiltinFunction] = &[
    BuiltinFunction::IoPrint,
    BuiltinFunction::IoPrintln,
    BuiltinFunction::IoPrintI32,
    BuiltinFunction::IoPrintF64,
    BuiltinFunction::IoReadLine,
    BuiltinFunction::MemAlloc,
    BuiltinFunction::MemFree,
    BuiltinFunction::StrLen,
    BuiltinFunction::StrConcat,
    BuiltinFunction::MathSqrt,
    BuiltinFunction::MathAbs,
];

/// A module exists iff some builtin's qualified name starts with `prefix::`.
pub fn module_exists(prefix: &str) -> bool {
    BUILTIN_FUNCTIONS
        .iter()
        .any(|f| f.qualified_name().starts_with(&format!("{}::", prefix)))
}

pub fn find_by_qualified_name(name: &str) -> Option<BuiltinFunction> {
    BUILTIN_FUNCTIONS
        .iter()
        .copied()
        .find(|f| f.qualified_name() == name)
}

pub fn functions_in_module(prefix: &str) -> impl Iterator<Item = BuiltinFunction> + '_ {
    let needle = format!("{}::", prefix);
    BUILTIN_FUNCTIONS
        .iter()
        .copied()
        .filter(move |f| f.qualified_name().starts_with(&needle))
}

/// Short module alias for a qualified name: `core::io::print` -> `io::print`.
/// Per §4.1, the import resolver registers both forms in the global scope.
pub fn short_name(qualified_name: &str) -> String {
    let parts: Vec<&str> = qualified_name.split("::").collect();
    if parts.len() <= 2 {
        qualified_name.to_string()
    } else {
        parts[parts.len() - 2..].join("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_exists_only_for_known_prefixes() {
        assert!(module_exists("core::io"));
        assert!(!module_exists("core::nope"));
    }

    #[test]
    fn short_name_keeps_last_two_segments() {
        assert_eq!(short_name("core::io::print"), "io::print");
    }
}
