//! Code generation from analysed models
//!
//! A [`Generator`] renders an [`AnalysedModel`] through a [`GeneratorProfile`]
//! into two texts: an interface (a C header for instance) and an
//! implementation. Both are pure functions of the model and the profile, so
//! one analysis can be rendered through any number of profiles.
//!
//! ```ignore
//! use cellgen::analyser::Analyser;
//! use cellgen::generator::{Generator, GeneratorProfile};
//!
//! let analysed = Analyser::new().analyse(&model);
//! let c = GeneratorProfile::c();
//! let generator = Generator::new(&analysed, &c);
//! std::fs::write("model.h", generator.interface_code())?;
//! std::fs::write("model.c", generator.implementation_code())?;
//! ```

pub mod profile;
mod render;

use tracing::debug;

use crate::analyser::{AnalysedModel, AnalysedVariable, EquationKind, ModelType, VariableType};

pub use profile::{GeneratorProfile, HelperFunction, ProfileKind};
pub use render::generate_double;
use render::{helper_for, Renderer};

/// Version written into generated code
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generated code ready to be written to disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    /// Interface text, empty for profiles without one
    pub interface: String,

    /// Implementation text
    pub implementation: String,
}

/// Code generator for an analysed model
pub struct Generator<'a> {
    model: &'a AnalysedModel,
    profile: &'a GeneratorProfile,
    renderer: Renderer<'a>,
}

impl<'a> Generator<'a> {
    pub fn new(model: &'a AnalysedModel, profile: &'a GeneratorProfile) -> Self {
        Self {
            model,
            profile,
            renderer: Renderer::new(model, profile),
        }
    }

    /// Both texts at once
    pub fn generate(&self) -> GeneratedCode {
        GeneratedCode {
            interface: self.interface_code(),
            implementation: self.implementation_code(),
        }
    }

    fn is_ode(&self) -> bool {
        self.model.model_type() == ModelType::Ode
    }

    // ═════════════════════════════════════════════════════════════════════════
    // Interface
    // ═════════════════════════════════════════════════════════════════════════

    pub fn interface_code(&self) -> String {
        let p = self.profile;
        if !self.model.model_type().is_valid() || !p.has_interface {
            return String::new();
        }

        let mut code = self.origin_comment();
        add(&mut code, &p.interface_header_string);
        add(
            &mut code,
            &format!(
                "{}{}",
                p.interface_version_string, p.interface_cellgen_version_string
            ),
        );
        add(
            &mut code,
            &format!(
                "{}{}",
                p.interface_state_count_string, p.interface_variable_count_string
            ),
        );
        add(&mut code, &self.sized(&p.variable_type_object_string));
        add(&mut code, &self.sized(&p.variable_info_object_string));
        add(&mut code, &self.sized(&p.variable_info_with_type_object_string));

        let mut info = String::new();
        if self.is_ode() {
            info.push_str(&p.interface_voi_info_string);
            info.push_str(&p.interface_state_info_string);
        }
        info.push_str(&p.interface_variable_info_string);
        add(&mut code, &info);

        for helper in self.helpers() {
            add(&mut code, &helper.interface);
        }

        let mut arrays = String::new();
        if self.is_ode() {
            arrays.push_str(&p.interface_create_states_array_method_string);
        }
        arrays.push_str(&p.interface_create_variables_array_method_string);
        arrays.push_str(&p.interface_delete_array_method_string);
        add(&mut code, &arrays);

        let mut methods = String::new();
        methods.push_str(&p.interface_initialize_states_and_constants_method_string);
        methods.push_str(&p.interface_compute_computed_constants_method_string);
        if self.is_ode() {
            methods.push_str(&p.interface_compute_rates_method_string);
        }
        methods.push_str(&p.interface_compute_variables_method_string);
        add(&mut code, &methods);

        debug!(bytes = code.len(), profile = %p.kind, "interface generated");
        code
    }

    // ═════════════════════════════════════════════════════════════════════════
    // Implementation
    // ═════════════════════════════════════════════════════════════════════════

    pub fn implementation_code(&self) -> String {
        let p = self.profile;
        if !self.model.model_type().is_valid() {
            return String::new();
        }

        let mut code = self.origin_comment();
        add(
            &mut code,
            &p.implementation_header_string
                .replace("<INTERFACE_FILE_NAME>", &p.interface_file_name_string),
        );

        let mut version = p.implementation_version_string.clone();
        if p.is_modified() {
            version = post_release(&version);
        }
        add(
            &mut code,
            &format!(
                "{}{}",
                version,
                p.implementation_cellgen_version_string
                    .replace("<VERSION>", VERSION)
            ),
        );
        add(
            &mut code,
            &format!(
                "{}{}",
                p.implementation_state_count_string
                    .replace("<STATE_COUNT>", &self.model.state_count().to_string()),
                p.implementation_variable_count_string
                    .replace("<VARIABLE_COUNT>", &self.model.variable_count().to_string())
            ),
        );

        if !p.has_interface {
            add(&mut code, &self.sized(&p.variable_type_object_string));
            add(&mut code, &self.sized(&p.variable_info_object_string));
            add(&mut code, &self.sized(&p.variable_info_with_type_object_string));
        }

        if self.is_ode() {
            if let Some(voi) = self.model.voi() {
                add(
                    &mut code,
                    &p.implementation_voi_info_string
                        .replace("<CODE>", &self.info_entry(voi, false)),
                );
            }
            add(
                &mut code,
                &p.implementation_state_info_string
                    .replace("<CODE>", &self.info_list(self.model.states(), false)),
            );
        }
        add(
            &mut code,
            &p.implementation_variable_info_string
                .replace("<CODE>", &self.info_list(self.model.variables(), true)),
        );

        for helper in self.helpers() {
            add(&mut code, &helper.implementation);
        }

        if self.is_ode() {
            add(
                &mut code,
                &self.create_array(&p.implementation_create_states_array_method_string, "STATE_COUNT"),
            );
        }
        add(
            &mut code,
            &self.create_array(
                &p.implementation_create_variables_array_method_string,
                "VARIABLE_COUNT",
            ),
        );
        add(&mut code, &p.implementation_delete_array_method_string);

        let mut remaining = vec![true; self.model.equations().len()];
        add(
            &mut code,
            &self.method(
                &p.implementation_initialize_states_and_constants_method_string,
                &self.initialization(&mut remaining),
            ),
        );
        let computed_constants = self.emit_kind(EquationKind::VariableBasedConstant, &mut remaining);
        add(
            &mut code,
            &self.method(
                &p.implementation_compute_computed_constants_method_string,
                &computed_constants,
            ),
        );
        if self.is_ode() {
            let rates = self.emit_kind(EquationKind::Rate, &mut remaining);
            add(
                &mut code,
                &self.method(&p.implementation_compute_rates_method_string, &rates),
            );
        }
        add(
            &mut code,
            &self.method(
                &p.implementation_compute_variables_method_string,
                &self.variables_body(&remaining),
            ),
        );

        debug!(bytes = code.len(), profile = %p.kind, "implementation generated");
        code
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sections
    // ─────────────────────────────────────────────────────────────────────────

    fn origin_comment(&self) -> String {
        let p = self.profile;
        if p.comment_string.is_empty() || p.origin_comment_string.is_empty() {
            return String::new();
        }
        let information = if p.is_modified() {
            format!("a modified {} profile of", p.kind)
        } else {
            format!("the {} profile of", p.kind)
        };
        let origin = p
            .origin_comment_string
            .replace("<PROFILE_INFORMATION>", &information)
            .replace("<VERSION>", VERSION);
        p.comment_string.replace("<CODE>", &origin)
    }

    /// Every variable reported in info tables
    fn reported(&self) -> impl Iterator<Item = &AnalysedVariable> {
        self.model
            .voi()
            .into_iter()
            .chain(self.model.states())
            .chain(self.model.variables())
    }

    /// Fill the size placeholders of a type definition
    fn sized(&self, template: &str) -> String {
        let size = |field: fn(&AnalysedVariable) -> usize| {
            self.reported().map(field).max().unwrap_or(0) + 1
        };
        template
            .replace(
                "<NAME_SIZE>",
                &size(|v| v.variable.name.len()).to_string(),
            )
            .replace(
                "<UNITS_SIZE>",
                &size(|v| v.variable.units.len()).to_string(),
            )
            .replace(
                "<COMPONENT_SIZE>",
                &size(|v| v.variable.component.len()).to_string(),
            )
    }

    fn info_entry(&self, variable: &AnalysedVariable, with_type: bool) -> String {
        let p = self.profile;
        let template = if with_type {
            &p.variable_info_with_type_entry_string
        } else {
            &p.variable_info_entry_string
        };
        let kind = match variable.kind {
            VariableType::Constant => &p.constant_variable_type_string,
            VariableType::ComputedConstant => &p.computed_constant_variable_type_string,
            VariableType::Algebraic
            | VariableType::State
            | VariableType::VariableOfIntegration => &p.algebraic_variable_type_string,
        };
        template
            .replace("<NAME>", &variable.variable.name)
            .replace("<UNITS>", &variable.variable.units)
            .replace("<COMPONENT>", &variable.variable.component)
            .replace("<TYPE>", kind)
    }

    fn info_list(&self, variables: &[AnalysedVariable], with_type: bool) -> String {
        let p = self.profile;
        let separator = format!("{}\n", p.array_element_separator_string);
        let entries: Vec<String> = variables
            .iter()
            .map(|variable| format!("{}{}", p.indent_string, self.info_entry(variable, with_type)))
            .collect();
        if entries.is_empty() {
            String::new()
        } else {
            format!("{}\n", entries.join(&separator))
        }
    }

    /// Helper functions used by the model, in declaration order, each once
    fn helpers(&self) -> Vec<&'a HelperFunction> {
        let profile = self.profile;
        self.model
            .needed_functions()
            .filter_map(|function| helper_for(profile, &function.kind()))
            .collect()
    }

    fn create_array(&self, template: &str, size: &str) -> String {
        let p = self.profile;
        let body = format!(
            "{}{}",
            p.indent_string,
            p.return_created_array_string.replace("<ARRAY_SIZE>", size)
        );
        template.replace("<CODE>", &body)
    }

    fn method(&self, template: &str, body: &str) -> String {
        let p = self.profile;
        let body = if !body.is_empty() {
            body.to_string()
        } else if p.empty_method_string.is_empty() {
            String::new()
        } else {
            format!("{}{}", p.indent_string, p.empty_method_string)
        };
        template.replace("<CODE>", &body)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Procedures
    // ─────────────────────────────────────────────────────────────────────────

    fn statement(&self, target: &str, value: &str) -> String {
        let p = self.profile;
        format!(
            "{}{}{}{}{}\n",
            p.indent_string, target, p.assignment_string, value, p.command_separator_string
        )
    }

    /// Emit an equation after the equations it depends on
    ///
    /// With `only_state_rate_based`, only algebraic dependencies that depend
    /// on states or rates are followed.
    fn emit(
        &self,
        position: usize,
        remaining: &mut [bool],
        only_state_rate_based: bool,
        out: &mut String,
    ) {
        let equations = self.model.equations();
        let equation = &equations[position];
        for &dependency in equation.dependencies() {
            let needed = !only_state_rate_based || {
                let dependency = &equations[dependency];
                dependency.kind() == EquationKind::Algebraic && dependency.is_state_rate_based()
            };
            if needed && remaining[dependency] {
                self.emit(dependency, remaining, only_state_rate_based, out);
            }
        }
        if remaining[position] {
            remaining[position] = false;
            let p = self.profile;
            out.push_str(&format!(
                "{}{}{}\n",
                p.indent_string,
                self.renderer.equation(equation.ast()),
                p.command_separator_string
            ));
        }
    }

    fn emit_kind(&self, kind: EquationKind, remaining: &mut [bool]) -> String {
        let mut out = String::new();
        for (position, equation) in self.model.equations().iter().enumerate() {
            if equation.kind() == kind {
                self.emit(position, remaining, false, &mut out);
            }
        }
        out
    }

    /// States and constants, literals first, then true constants
    fn initialization(&self, remaining: &mut [bool]) -> String {
        let initialised: Vec<&AnalysedVariable> = self
            .model
            .states()
            .iter()
            .chain(
                self.model
                    .variables()
                    .iter()
                    .filter(|v| v.kind == VariableType::Constant),
            )
            .collect();

        let mut out = String::new();
        let mut references = String::new();
        for variable in initialised {
            let target = self
                .renderer
                .variable_name(variable.kind, variable.index, false);
            let Some(initial) = &variable.initial_value_variable.initial_value else {
                continue;
            };
            if let Some(literal) = initial.literal() {
                out.push_str(&self.statement(&target, &generate_double(&literal)));
            } else if let Some(name) = initial.variable_name() {
                let component = &variable.initial_value_variable.component;
                if let Some((kind, index)) = self.model.binding_of(component, name) {
                    let value = self.renderer.variable_name(kind, index, false);
                    references.push_str(&self.statement(&target, &value));
                }
            }
        }
        out.push_str(&references);
        out.push_str(&self.emit_kind(EquationKind::TrueConstant, remaining));
        out
    }

    /// Everything not emitted so far, plus algebraic equations depending on
    /// states or rates
    fn variables_body(&self, remaining: &[bool]) -> String {
        let equations = self.model.equations();
        let mut fresh = vec![true; equations.len()];
        let mut out = String::new();
        for (position, equation) in equations.iter().enumerate() {
            let rate_based_algebraic =
                equation.kind() == EquationKind::Algebraic && equation.is_state_rate_based();
            if remaining[position] || rate_based_algebraic {
                self.emit(position, &mut fresh, true, &mut out);
            }
        }
        out
    }
}

/// Append a section, separated from what precedes it by a blank line
fn add(code: &mut String, section: &str) {
    if section.is_empty() {
        return;
    }
    if !code.is_empty() {
        code.push('\n');
    }
    code.push_str(section);
}

/// Mark the first `x.y.z` version in `text` as a post release
fn post_release(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        if bytes[start].is_ascii_digit() {
            let mut end = start;
            let mut dots = 0;
            while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                if bytes[end] == b'.' {
                    dots += 1;
                }
                end += 1;
            }
            if dots == 2 && bytes[end - 1].is_ascii_digit() {
                return format!("{}.post0{}", &text[..end], &text[end..]);
            }
            start = end;
        } else {
            start += 1;
        }
    }
    text.to_string()
}
