//! Target language templates
//!
//! A [`GeneratorProfile`] holds every piece of text the generator emits. Two
//! defaults exist, [`GeneratorProfile::c`] and [`GeneratorProfile::python`];
//! any field can be overridden, either in code or from a JSON document read
//! by [`GeneratorProfile::from_json`].
//!
//! Templates use the placeholders `<CODE>`, `<NAME>`, `<UNITS>`,
//! `<COMPONENT>`, `<TYPE>`, `<STATE_COUNT>`, `<VARIABLE_COUNT>`,
//! `<ARRAY_SIZE>`, `<NAME_SIZE>`, `<UNITS_SIZE>`, `<COMPONENT_SIZE>`,
//! `<CONDITION>`, `<IF_STATEMENT>`, `<ELSE_STATEMENT>`,
//! `<INTERFACE_FILE_NAME>`, `<PROFILE_INFORMATION>` and `<VERSION>`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CellgenError;

/// Language a profile was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    C,
    Python,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => f.write_str("C"),
            Self::Python => f.write_str("Python"),
        }
    }
}

/// A helper function emitted when an expression needs it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelperFunction {
    /// Declaration written to the interface
    #[serde(default)]
    pub interface: String,
    /// Definition written to the implementation
    #[serde(default)]
    pub implementation: String,
}

impl HelperFunction {
    fn new(interface: &str, implementation: &str) -> Self {
        Self {
            interface: interface.to_string(),
            implementation: implementation.to_string(),
        }
    }

    fn implementation(implementation: &str) -> Self {
        Self::new("", implementation)
    }

    pub fn is_empty(&self) -> bool {
        self.implementation.is_empty()
    }
}

/// Every template and flag driving code generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorProfile {
    pub kind: ProfileKind,

    // ─────────────────────────────────────────────────────────────────────────
    // Relational and logical operators
    // ─────────────────────────────────────────────────────────────────────────
    pub assignment_string: String,
    pub eq_string: String,
    pub neq_string: String,
    pub lt_string: String,
    pub leq_string: String,
    pub gt_string: String,
    pub geq_string: String,
    pub and_string: String,
    pub or_string: String,
    pub xor_string: String,
    pub not_string: String,
    pub has_eq_operator: bool,
    pub has_neq_operator: bool,
    pub has_lt_operator: bool,
    pub has_leq_operator: bool,
    pub has_gt_operator: bool,
    pub has_geq_operator: bool,
    pub has_and_operator: bool,
    pub has_or_operator: bool,
    pub has_xor_operator: bool,
    pub has_not_operator: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Arithmetic operators
    // ─────────────────────────────────────────────────────────────────────────
    pub plus_string: String,
    pub minus_string: String,
    pub times_string: String,
    pub divide_string: String,
    pub power_string: String,
    pub square_root_string: String,
    pub square_string: String,
    pub absolute_value_string: String,
    pub exponential_string: String,
    pub natural_logarithm_string: String,
    pub common_logarithm_string: String,
    pub ceiling_string: String,
    pub floor_string: String,
    pub min_string: String,
    pub max_string: String,
    pub remainder_string: String,
    pub has_power_operator: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Trigonometric operators
    // ─────────────────────────────────────────────────────────────────────────
    pub sin_string: String,
    pub cos_string: String,
    pub tan_string: String,
    pub sec_string: String,
    pub csc_string: String,
    pub cot_string: String,
    pub sinh_string: String,
    pub cosh_string: String,
    pub tanh_string: String,
    pub sech_string: String,
    pub csch_string: String,
    pub coth_string: String,
    pub asin_string: String,
    pub acos_string: String,
    pub atan_string: String,
    pub asec_string: String,
    pub acsc_string: String,
    pub acot_string: String,
    pub asinh_string: String,
    pub acosh_string: String,
    pub atanh_string: String,
    pub asech_string: String,
    pub acsch_string: String,
    pub acoth_string: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Piecewise statement
    // ─────────────────────────────────────────────────────────────────────────
    pub conditional_operator_if_string: String,
    pub conditional_operator_else_string: String,
    pub piecewise_if_string: String,
    pub piecewise_else_string: String,
    pub has_conditional_operator: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Constants
    // ─────────────────────────────────────────────────────────────────────────
    pub true_string: String,
    pub false_string: String,
    pub e_string: String,
    pub pi_string: String,
    pub inf_string: String,
    pub nan_string: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Helper functions
    // ─────────────────────────────────────────────────────────────────────────
    pub eq_function: HelperFunction,
    pub neq_function: HelperFunction,
    pub lt_function: HelperFunction,
    pub leq_function: HelperFunction,
    pub gt_function: HelperFunction,
    pub geq_function: HelperFunction,
    pub and_function: HelperFunction,
    pub or_function: HelperFunction,
    pub xor_function: HelperFunction,
    pub not_function: HelperFunction,
    pub min_function: HelperFunction,
    pub max_function: HelperFunction,
    pub sec_function: HelperFunction,
    pub csc_function: HelperFunction,
    pub cot_function: HelperFunction,
    pub sech_function: HelperFunction,
    pub csch_function: HelperFunction,
    pub coth_function: HelperFunction,
    pub asec_function: HelperFunction,
    pub acsc_function: HelperFunction,
    pub acot_function: HelperFunction,
    pub asech_function: HelperFunction,
    pub acsch_function: HelperFunction,
    pub acoth_function: HelperFunction,

    // ─────────────────────────────────────────────────────────────────────────
    // Miscellaneous
    // ─────────────────────────────────────────────────────────────────────────
    pub comment_string: String,
    pub origin_comment_string: String,

    pub interface_file_name_string: String,
    pub interface_header_string: String,
    pub implementation_header_string: String,

    pub interface_version_string: String,
    pub implementation_version_string: String,
    pub interface_cellgen_version_string: String,
    pub implementation_cellgen_version_string: String,

    pub interface_state_count_string: String,
    pub implementation_state_count_string: String,
    pub interface_variable_count_string: String,
    pub implementation_variable_count_string: String,

    pub variable_type_object_string: String,
    pub constant_variable_type_string: String,
    pub computed_constant_variable_type_string: String,
    pub algebraic_variable_type_string: String,

    pub variable_info_object_string: String,
    pub variable_info_with_type_object_string: String,

    pub interface_voi_info_string: String,
    pub implementation_voi_info_string: String,
    pub interface_state_info_string: String,
    pub implementation_state_info_string: String,
    pub interface_variable_info_string: String,
    pub implementation_variable_info_string: String,

    pub variable_info_entry_string: String,
    pub variable_info_with_type_entry_string: String,

    pub voi_string: String,
    pub states_array_string: String,
    pub rates_array_string: String,
    pub variables_array_string: String,

    pub return_created_array_string: String,
    pub interface_create_states_array_method_string: String,
    pub implementation_create_states_array_method_string: String,
    pub interface_create_variables_array_method_string: String,
    pub implementation_create_variables_array_method_string: String,
    pub interface_delete_array_method_string: String,
    pub implementation_delete_array_method_string: String,

    pub interface_initialize_states_and_constants_method_string: String,
    pub implementation_initialize_states_and_constants_method_string: String,
    pub interface_compute_computed_constants_method_string: String,
    pub implementation_compute_computed_constants_method_string: String,
    pub interface_compute_rates_method_string: String,
    pub implementation_compute_rates_method_string: String,
    pub interface_compute_variables_method_string: String,
    pub implementation_compute_variables_method_string: String,

    pub empty_method_string: String,
    pub indent_string: String,
    pub open_array_initializer_string: String,
    pub close_array_initializer_string: String,
    pub open_array_string: String,
    pub close_array_string: String,
    pub array_element_separator_string: String,
    pub string_delimiter_string: String,
    pub command_separator_string: String,

    pub has_interface: bool,
}

impl Default for GeneratorProfile {
    fn default() -> Self {
        Self::c()
    }
}

fn s(text: &str) -> String {
    text.to_string()
}

impl GeneratorProfile {
    /// The default profile of `kind`
    pub fn default_for(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::C => Self::c(),
            ProfileKind::Python => Self::python(),
        }
    }

    /// Whether any field differs from the default of the profile's kind
    pub fn is_modified(&self) -> bool {
        *self != Self::default_for(self.kind)
    }

    /// Profile generating a C header and source file
    pub fn c() -> Self {
        Self {
            kind: ProfileKind::C,

            assignment_string: s(" = "),
            eq_string: s(" == "),
            neq_string: s(" != "),
            lt_string: s(" < "),
            leq_string: s(" <= "),
            gt_string: s(" > "),
            geq_string: s(" >= "),
            and_string: s(" && "),
            or_string: s(" || "),
            xor_string: s("xor"),
            not_string: s("!"),
            has_eq_operator: true,
            has_neq_operator: true,
            has_lt_operator: true,
            has_leq_operator: true,
            has_gt_operator: true,
            has_geq_operator: true,
            has_and_operator: true,
            has_or_operator: true,
            has_xor_operator: false,
            has_not_operator: true,

            plus_string: s("+"),
            minus_string: s("-"),
            times_string: s("*"),
            divide_string: s("/"),
            power_string: s("pow"),
            square_root_string: s("sqrt"),
            square_string: s(""),
            absolute_value_string: s("fabs"),
            exponential_string: s("exp"),
            natural_logarithm_string: s("log"),
            common_logarithm_string: s("log10"),
            ceiling_string: s("ceil"),
            floor_string: s("floor"),
            min_string: s("min"),
            max_string: s("max"),
            remainder_string: s("fmod"),
            has_power_operator: false,

            sin_string: s("sin"),
            cos_string: s("cos"),
            tan_string: s("tan"),
            sec_string: s("sec"),
            csc_string: s("csc"),
            cot_string: s("cot"),
            sinh_string: s("sinh"),
            cosh_string: s("cosh"),
            tanh_string: s("tanh"),
            sech_string: s("sech"),
            csch_string: s("csch"),
            coth_string: s("coth"),
            asin_string: s("asin"),
            acos_string: s("acos"),
            atan_string: s("atan"),
            asec_string: s("asec"),
            acsc_string: s("acsc"),
            acot_string: s("acot"),
            asinh_string: s("asinh"),
            acosh_string: s("acosh"),
            atanh_string: s("atanh"),
            asech_string: s("asech"),
            acsch_string: s("acsch"),
            acoth_string: s("acoth"),

            conditional_operator_if_string: s("(<CONDITION>)?<IF_STATEMENT>"),
            conditional_operator_else_string: s(":<ELSE_STATEMENT>"),
            piecewise_if_string: s(""),
            piecewise_else_string: s(""),
            has_conditional_operator: true,

            true_string: s("1.0"),
            false_string: s("0.0"),
            e_string: s("2.71828182845905"),
            pi_string: s("3.14159265358979"),
            inf_string: s("1.0/0.0"),
            nan_string: s("sqrt(-1.0)"),

            eq_function: HelperFunction::default(),
            neq_function: HelperFunction::default(),
            lt_function: HelperFunction::default(),
            leq_function: HelperFunction::default(),
            gt_function: HelperFunction::default(),
            geq_function: HelperFunction::default(),
            and_function: HelperFunction::default(),
            or_function: HelperFunction::default(),
            xor_function: HelperFunction::new(
                "extern double xor(double x, double y);\n",
                "double xor(double x, double y)\n\
                 {\n\
                 \x20   return (x != 0.0) ^ (y != 0.0);\n\
                 }\n",
            ),
            not_function: HelperFunction::default(),
            min_function: HelperFunction::new(
                "extern double min(double x, double y);\n",
                "double min(double x, double y)\n\
                 {\n\
                 \x20   return (x < y)?x:y;\n\
                 }\n",
            ),
            max_function: HelperFunction::new(
                "extern double max(double x, double y);\n",
                "double max(double x, double y)\n\
                 {\n\
                 \x20   return (x > y)?x:y;\n\
                 }\n",
            ),
            sec_function: c_unary("sec", "return 1.0/cos(x);"),
            csc_function: c_unary("csc", "return 1.0/sin(x);"),
            cot_function: c_unary("cot", "return 1.0/tan(x);"),
            sech_function: c_unary("sech", "return 1.0/cosh(x);"),
            csch_function: c_unary("csch", "return 1.0/sinh(x);"),
            coth_function: c_unary("coth", "return 1.0/tanh(x);"),
            asec_function: c_unary("asec", "return acos(1.0/x);"),
            acsc_function: c_unary("acsc", "return asin(1.0/x);"),
            acot_function: c_unary("acot", "return atan(1.0/x);"),
            asech_function: c_unary(
                "asech",
                "double oneOverX = 1.0/x;\n\n    return log(oneOverX+sqrt(oneOverX*oneOverX-1.0));",
            ),
            acsch_function: c_unary(
                "acsch",
                "double oneOverX = 1.0/x;\n\n    return log(oneOverX+sqrt(oneOverX*oneOverX+1.0));",
            ),
            acoth_function: c_unary(
                "acoth",
                "double oneOverX = 1.0/x;\n\n    return 0.5*log((1.0+oneOverX)/(1.0-oneOverX));",
            ),

            comment_string: s("/* <CODE> */\n"),
            origin_comment_string: s(
                "The content of this file was generated using <PROFILE_INFORMATION> cellgen <VERSION>.",
            ),

            interface_file_name_string: s("model.h"),
            interface_header_string: s("#pragma once\n\n#include <stddef.h>\n"),
            implementation_header_string: s(
                "#include \"<INTERFACE_FILE_NAME>\"\n\n#include <math.h>\n#include <stdlib.h>\n",
            ),

            interface_version_string: s("extern const char VERSION[];\n"),
            implementation_version_string: s("const char VERSION[] = \"0.1.0\";\n"),
            interface_cellgen_version_string: s("extern const char CELLGEN_VERSION[];\n"),
            implementation_cellgen_version_string: s(
                "const char CELLGEN_VERSION[] = \"<VERSION>\";\n",
            ),

            interface_state_count_string: s("extern const size_t STATE_COUNT;\n"),
            implementation_state_count_string: s("const size_t STATE_COUNT = <STATE_COUNT>;\n"),
            interface_variable_count_string: s("extern const size_t VARIABLE_COUNT;\n"),
            implementation_variable_count_string: s(
                "const size_t VARIABLE_COUNT = <VARIABLE_COUNT>;\n",
            ),

            variable_type_object_string: s(
                "typedef enum {\n    CONSTANT,\n    COMPUTED_CONSTANT,\n    ALGEBRAIC\n} VariableType;\n",
            ),
            constant_variable_type_string: s("CONSTANT"),
            computed_constant_variable_type_string: s("COMPUTED_CONSTANT"),
            algebraic_variable_type_string: s("ALGEBRAIC"),

            variable_info_object_string: s(
                "typedef struct {\n    char name[<NAME_SIZE>];\n    char units[<UNITS_SIZE>];\n    char component[<COMPONENT_SIZE>];\n} VariableInfo;\n",
            ),
            variable_info_with_type_object_string: s(
                "typedef struct {\n    char name[<NAME_SIZE>];\n    char units[<UNITS_SIZE>];\n    char component[<COMPONENT_SIZE>];\n    VariableType type;\n} VariableInfoWithType;\n",
            ),

            interface_voi_info_string: s("extern const VariableInfo VOI_INFO;\n"),
            implementation_voi_info_string: s("const VariableInfo VOI_INFO = <CODE>;\n"),
            interface_state_info_string: s("extern const VariableInfo STATE_INFO[];\n"),
            implementation_state_info_string: s("const VariableInfo STATE_INFO[] = {\n<CODE>};\n"),
            interface_variable_info_string: s("extern const VariableInfoWithType VARIABLE_INFO[];\n"),
            implementation_variable_info_string: s(
                "const VariableInfoWithType VARIABLE_INFO[] = {\n<CODE>};\n",
            ),

            variable_info_entry_string: s("{\"<NAME>\", \"<UNITS>\", \"<COMPONENT>\"}"),
            variable_info_with_type_entry_string: s(
                "{\"<NAME>\", \"<UNITS>\", \"<COMPONENT>\", <TYPE>}",
            ),

            voi_string: s("voi"),
            states_array_string: s("states"),
            rates_array_string: s("rates"),
            variables_array_string: s("variables"),

            return_created_array_string: s(
                "return (double *) malloc(<ARRAY_SIZE>*sizeof(double));\n",
            ),
            interface_create_states_array_method_string: s("double * createStatesArray();\n"),
            implementation_create_states_array_method_string: s(
                "double * createStatesArray()\n{\n<CODE>}\n",
            ),
            interface_create_variables_array_method_string: s(
                "double * createVariablesArray();\n",
            ),
            implementation_create_variables_array_method_string: s(
                "double * createVariablesArray()\n{\n<CODE>}\n",
            ),
            interface_delete_array_method_string: s("void deleteArray(double *array);\n"),
            implementation_delete_array_method_string: s(
                "void deleteArray(double *array)\n{\n    free(array);\n}\n",
            ),

            interface_initialize_states_and_constants_method_string: s(
                "void initializeStatesAndConstants(double *states, double *variables);\n",
            ),
            implementation_initialize_states_and_constants_method_string: s(
                "void initializeStatesAndConstants(double *states, double *variables)\n{\n<CODE>}\n",
            ),
            interface_compute_computed_constants_method_string: s(
                "void computeComputedConstants(double *variables);\n",
            ),
            implementation_compute_computed_constants_method_string: s(
                "void computeComputedConstants(double *variables)\n{\n<CODE>}\n",
            ),
            interface_compute_rates_method_string: s(
                "void computeRates(double voi, double *states, double *rates, double *variables);\n",
            ),
            implementation_compute_rates_method_string: s(
                "void computeRates(double voi, double *states, double *rates, double *variables)\n{\n<CODE>}\n",
            ),
            interface_compute_variables_method_string: s(
                "void computeVariables(double voi, double *states, double *rates, double *variables);\n",
            ),
            implementation_compute_variables_method_string: s(
                "void computeVariables(double voi, double *states, double *rates, double *variables)\n{\n<CODE>}\n",
            ),

            empty_method_string: s(""),
            indent_string: s("    "),
            open_array_initializer_string: s("{"),
            close_array_initializer_string: s("}"),
            open_array_string: s("["),
            close_array_string: s("]"),
            array_element_separator_string: s(","),
            string_delimiter_string: s("\""),
            command_separator_string: s(";"),

            has_interface: true,
        }
    }

    /// Profile generating a single Python module
    pub fn python() -> Self {
        Self {
            kind: ProfileKind::Python,

            assignment_string: s(" = "),
            eq_string: s("eq_func"),
            neq_string: s("neq_func"),
            lt_string: s("lt_func"),
            leq_string: s("leq_func"),
            gt_string: s("gt_func"),
            geq_string: s("geq_func"),
            and_string: s("and_func"),
            or_string: s("or_func"),
            xor_string: s("xor_func"),
            not_string: s("not_func"),
            has_eq_operator: false,
            has_neq_operator: false,
            has_lt_operator: false,
            has_leq_operator: false,
            has_gt_operator: false,
            has_geq_operator: false,
            has_and_operator: false,
            has_or_operator: false,
            has_xor_operator: false,
            has_not_operator: false,

            plus_string: s("+"),
            minus_string: s("-"),
            times_string: s("*"),
            divide_string: s("/"),
            power_string: s("**"),
            square_root_string: s("sqrt"),
            square_string: s(""),
            absolute_value_string: s("fabs"),
            exponential_string: s("exp"),
            natural_logarithm_string: s("log"),
            common_logarithm_string: s("log10"),
            ceiling_string: s("ceil"),
            floor_string: s("floor"),
            min_string: s("min"),
            max_string: s("max"),
            remainder_string: s("fmod"),
            has_power_operator: true,

            sin_string: s("sin"),
            cos_string: s("cos"),
            tan_string: s("tan"),
            sec_string: s("sec"),
            csc_string: s("csc"),
            cot_string: s("cot"),
            sinh_string: s("sinh"),
            cosh_string: s("cosh"),
            tanh_string: s("tanh"),
            sech_string: s("sech"),
            csch_string: s("csch"),
            coth_string: s("coth"),
            asin_string: s("asin"),
            acos_string: s("acos"),
            atan_string: s("atan"),
            asec_string: s("asec"),
            acsc_string: s("acsc"),
            acot_string: s("acot"),
            asinh_string: s("asinh"),
            acosh_string: s("acosh"),
            atanh_string: s("atanh"),
            asech_string: s("asech"),
            acsch_string: s("acsch"),
            acoth_string: s("acoth"),

            conditional_operator_if_string: s("<IF_STATEMENT> if <CONDITION>"),
            conditional_operator_else_string: s(" else <ELSE_STATEMENT>"),
            piecewise_if_string: s(""),
            piecewise_else_string: s(""),
            has_conditional_operator: true,

            true_string: s("1.0"),
            false_string: s("0.0"),
            e_string: s("e"),
            pi_string: s("pi"),
            inf_string: s("inf"),
            nan_string: s("nan"),

            eq_function: python_binary("eq_func", "return 1.0 if x == y else 0.0"),
            neq_function: python_binary("neq_func", "return 1.0 if x != y else 0.0"),
            lt_function: python_binary("lt_func", "return 1.0 if x < y else 0.0"),
            leq_function: python_binary("leq_func", "return 1.0 if x <= y else 0.0"),
            gt_function: python_binary("gt_func", "return 1.0 if x > y else 0.0"),
            geq_function: python_binary("geq_func", "return 1.0 if x >= y else 0.0"),
            and_function: python_binary("and_func", "return 1.0 if bool(x) & bool(y) else 0.0"),
            or_function: python_binary("or_func", "return 1.0 if bool(x) | bool(y) else 0.0"),
            xor_function: python_binary("xor_func", "return 1.0 if bool(x) ^ bool(y) else 0.0"),
            not_function: python_unary("not_func", "return 1.0 if not bool(x) else 0.0"),
            min_function: HelperFunction::default(),
            max_function: HelperFunction::default(),
            sec_function: python_unary("sec", "return 1.0/cos(x)"),
            csc_function: python_unary("csc", "return 1.0/sin(x)"),
            cot_function: python_unary("cot", "return 1.0/tan(x)"),
            sech_function: python_unary("sech", "return 1.0/cosh(x)"),
            csch_function: python_unary("csch", "return 1.0/sinh(x)"),
            coth_function: python_unary("coth", "return 1.0/tanh(x)"),
            asec_function: python_unary("asec", "return acos(1.0/x)"),
            acsc_function: python_unary("acsc", "return asin(1.0/x)"),
            acot_function: python_unary("acot", "return atan(1.0/x)"),
            asech_function: python_unary(
                "asech",
                "one_over_x = 1.0/x\n\n    return log(one_over_x+sqrt(one_over_x*one_over_x-1.0))",
            ),
            acsch_function: python_unary(
                "acsch",
                "one_over_x = 1.0/x\n\n    return log(one_over_x+sqrt(one_over_x*one_over_x+1.0))",
            ),
            acoth_function: python_unary(
                "acoth",
                "one_over_x = 1.0/x\n\n    return 0.5*log((1.0+one_over_x)/(1.0-one_over_x))",
            ),

            comment_string: s("# <CODE>\n"),
            origin_comment_string: s(
                "The content of this file was generated using <PROFILE_INFORMATION> cellgen <VERSION>.",
            ),

            interface_file_name_string: s(""),
            interface_header_string: s(""),
            implementation_header_string: s("from enum import Enum\nfrom math import *\n\n"),

            interface_version_string: s(""),
            implementation_version_string: s("__version__ = \"0.1.0\"\n"),
            interface_cellgen_version_string: s(""),
            implementation_cellgen_version_string: s("CELLGEN_VERSION = \"<VERSION>\"\n"),

            interface_state_count_string: s(""),
            implementation_state_count_string: s("STATE_COUNT = <STATE_COUNT>\n"),
            interface_variable_count_string: s(""),
            implementation_variable_count_string: s("VARIABLE_COUNT = <VARIABLE_COUNT>\n"),

            variable_type_object_string: s(
                "class VariableType(Enum):\n    CONSTANT = 1\n    COMPUTED_CONSTANT = 2\n    ALGEBRAIC = 3\n",
            ),
            constant_variable_type_string: s("VariableType.CONSTANT"),
            computed_constant_variable_type_string: s("VariableType.COMPUTED_CONSTANT"),
            algebraic_variable_type_string: s("VariableType.ALGEBRAIC"),

            variable_info_object_string: s(""),
            variable_info_with_type_object_string: s(""),

            interface_voi_info_string: s(""),
            implementation_voi_info_string: s("VOI_INFO = <CODE>\n"),
            interface_state_info_string: s(""),
            implementation_state_info_string: s("STATE_INFO = [\n<CODE>]\n"),
            interface_variable_info_string: s(""),
            implementation_variable_info_string: s("VARIABLE_INFO = [\n<CODE>]\n"),

            variable_info_entry_string: s(
                "{\"name\": \"<NAME>\", \"units\": \"<UNITS>\", \"component\": \"<COMPONENT>\"}",
            ),
            variable_info_with_type_entry_string: s(
                "{\"name\": \"<NAME>\", \"units\": \"<UNITS>\", \"component\": \"<COMPONENT>\", \"type\": <TYPE>}",
            ),

            voi_string: s("voi"),
            states_array_string: s("states"),
            rates_array_string: s("rates"),
            variables_array_string: s("variables"),

            return_created_array_string: s("return [nan]*<ARRAY_SIZE>\n"),
            interface_create_states_array_method_string: s(""),
            implementation_create_states_array_method_string: s(
                "def create_states_array():\n<CODE>",
            ),
            interface_create_variables_array_method_string: s(""),
            implementation_create_variables_array_method_string: s(
                "def create_variables_array():\n<CODE>",
            ),
            interface_delete_array_method_string: s(""),
            implementation_delete_array_method_string: s(""),

            interface_initialize_states_and_constants_method_string: s(""),
            implementation_initialize_states_and_constants_method_string: s(
                "def initialize_states_and_constants(states, variables):\n<CODE>",
            ),
            interface_compute_computed_constants_method_string: s(""),
            implementation_compute_computed_constants_method_string: s(
                "def compute_computed_constants(variables):\n<CODE>",
            ),
            interface_compute_rates_method_string: s(""),
            implementation_compute_rates_method_string: s(
                "def compute_rates(voi, states, rates, variables):\n<CODE>",
            ),
            interface_compute_variables_method_string: s(""),
            implementation_compute_variables_method_string: s(
                "def compute_variables(voi, states, rates, variables):\n<CODE>",
            ),

            empty_method_string: s("pass\n"),
            indent_string: s("    "),
            open_array_initializer_string: s("["),
            close_array_initializer_string: s("]"),
            open_array_string: s("["),
            close_array_string: s("]"),
            array_element_separator_string: s(","),
            string_delimiter_string: s("\""),
            command_separator_string: s(""),

            has_interface: false,
        }
    }

    /// Load a profile from JSON
    ///
    /// The document is an object whose optional `kind` (`"c"` or `"python"`,
    /// default `"c"`) selects the defaults; every other key overrides the field
    /// of the same name. Unknown keys are rejected.
    pub fn from_json(json: &str) -> Result<Self, CellgenError> {
        let overrides: Value = serde_json::from_str(json)?;
        let Value::Object(overrides) = overrides else {
            return Err(CellgenError::Profile(
                "a profile must be a JSON object".to_string(),
            ));
        };

        let kind = match overrides.get("kind") {
            Some(kind) => serde_json::from_value(kind.clone())?,
            None => ProfileKind::C,
        };
        let mut merged = serde_json::to_value(Self::default_for(kind))?;
        let Value::Object(fields) = &mut merged else {
            return Err(CellgenError::Profile(
                "profile did not serialize to an object".to_string(),
            ));
        };
        for (key, value) in overrides {
            if !fields.contains_key(&key) {
                return Err(CellgenError::Profile(format!("unknown profile field '{}'", key)));
            }
            fields.insert(key, value);
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Serialize the full profile as pretty printed JSON
    pub fn to_json(&self) -> Result<String, CellgenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn c_unary(name: &str, body: &str) -> HelperFunction {
    HelperFunction::new(
        &format!("extern double {}(double x);\n", name),
        &format!("double {}(double x)\n{{\n    {}\n}}\n", name, body),
    )
}

fn python_unary(name: &str, body: &str) -> HelperFunction {
    HelperFunction::implementation(&format!("def {}(x):\n    {}\n", name, body))
}

fn python_binary(name: &str, body: &str) -> HelperFunction {
    HelperFunction::implementation(&format!("def {}(x, y):\n    {}\n", name, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unmodified() {
        assert!(!GeneratorProfile::c().is_modified());
        assert!(!GeneratorProfile::python().is_modified());
        assert_eq!(GeneratorProfile::default(), GeneratorProfile::c());
    }

    #[test]
    fn test_modified_profile() {
        let mut profile = GeneratorProfile::c();
        profile.indent_string = "\t".to_string();
        assert!(profile.is_modified());
    }

    #[test]
    fn test_c_helper_text() {
        let profile = GeneratorProfile::c();
        assert_eq!(
            profile.sec_function.implementation,
            "double sec(double x)\n{\n    return 1.0/cos(x);\n}\n"
        );
        assert_eq!(
            profile.xor_function.implementation,
            "double xor(double x, double y)\n{\n    return (x != 0.0) ^ (y != 0.0);\n}\n"
        );
        assert!(profile.eq_function.is_empty());
    }

    #[test]
    fn test_from_json_overrides_python_defaults() {
        let profile =
            GeneratorProfile::from_json(r#"{ "kind": "python", "indent_string": "  " }"#).unwrap();
        assert_eq!(profile.kind, ProfileKind::Python);
        assert_eq!(profile.indent_string, "  ");
        assert_eq!(profile.power_string, "**");
        assert!(profile.is_modified());
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let result = GeneratorProfile::from_json(r#"{ "indentation": "  " }"#);
        assert!(matches!(result, Err(CellgenError::Profile(_))));
    }

    #[test]
    fn test_round_trip_through_json() {
        let json = GeneratorProfile::python().to_json().unwrap();
        assert_eq!(
            GeneratorProfile::from_json(&json).unwrap(),
            GeneratorProfile::python()
        );
    }
}
