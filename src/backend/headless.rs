//! A software stand-in for the shader side of an OpenGL context.
//!
//! It keeps the object model of GL (names, compile and link status, info logs, per-program uniform
//! storage, the current program) and checks just enough GLSL to tell a working shader pair from a
//! broken one: directives, brackets, statement terminators, global interface declarations and the
//! vertex to fragment interface at link time. It does not execute shaders.

use std::cell::RefCell;
use std::collections::HashMap;
use gl::types::{GLfloat, GLint, GLuint};
use crate::backend::{ShaderBackend, ShaderStage, UNKNOWN_LOCATION};
use crate::shaders::UniformValue;

const KNOWN_TYPES: &[&str] = &[
    "bool", "int", "uint", "float", "double",
    "vec2", "vec3", "vec4",
    "ivec2", "ivec3", "ivec4",
    "uvec2", "uvec3", "uvec4",
    "bvec2", "bvec3", "bvec4",
    "mat2", "mat3", "mat4",
    "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler2DArray", "sampler2DShadow",
];

const INTERPOLATION_QUALIFIERS: &[&str] = &["flat", "smooth", "noperspective", "centroid", "highp", "mediump", "lowp"];

const CONTROL_KEYWORDS: &[&str] = &["if", "else", "for", "while", "do", "switch"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub ty: String,
    pub name: String,
}

#[derive(Clone, Debug, Default)]
struct Interface {
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    uniforms: Vec<Variable>,
    has_main: bool,
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
    interface: Interface,
    delete_pending: bool,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<GLuint>,
    linked: bool,
    info_log: String,
    uniforms: Vec<Variable>,
    values: Vec<Option<UniformValue>>,
    delete_pending: bool,
}

#[derive(Default)]
struct State {
    last_name: GLuint,
    shaders: HashMap<GLuint, ShaderObject>,
    programs: HashMap<GLuint, ProgramObject>,
    current: GLuint,
}

impl State {
    fn next_name(&mut self) -> GLuint {
        self.last_name += 1;
        self.last_name
    }

    fn is_attached(&self, shader: GLuint) -> bool {
        self.programs.values().any(|p| p.attached.contains(&shader))
    }

    /// Detaches `shader`, finishing a deferred deletion once nothing holds it.
    fn detach(&mut self, program: GLuint, shader: GLuint) {
        if let Some(object) = self.programs.get_mut(&program) {
            object.attached.retain(|s| *s != shader);
        }
        let pending = self.shaders.get(&shader).map(|s| s.delete_pending).unwrap_or(false);
        if pending && !self.is_attached(shader) {
            self.shaders.remove(&shader);
        }
    }

    /// Deletes a program for good, releasing its attachments.
    fn destroy_program(&mut self, program: GLuint) {
        let attached = match self.programs.get(&program) {
            Some(object) => object.attached.clone(),
            None => return,
        };
        for shader in attached {
            self.detach(program, shader);
        }
        self.programs.remove(&program);
    }

    fn current_program(&mut self) -> Option<&mut ProgramObject> {
        if self.current == 0 {
            return None;
        }
        self.programs.get_mut(&self.current).filter(|p| p.linked)
    }
}

#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<State>,
}

impl HeadlessBackend {
    pub fn new() -> HeadlessBackend {
        HeadlessBackend::default()
    }

    /// Name of the current program, `0` when none is. A deleted program stays current until
    /// another one is used.
    pub fn current_program(&self) -> GLuint {
        self.state.borrow().current
    }

    /// Shader objects that exist, including ones flagged for deletion while attached.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Program objects that exist, including a deleted one that is still current.
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Last value assigned to `name` in `program`, if any.
    pub fn uniform_value(&self, program: GLuint, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let index = program.uniforms.iter().position(|u| u.name == name)?;
        program.values[index]
    }

    /// Uniforms of a linked program in location order.
    pub fn active_uniforms(&self, program: GLuint) -> Vec<Variable> {
        let state = self.state.borrow();
        state.programs.get(&program).map(|p| p.uniforms.clone()).unwrap_or_default()
    }

    /// Stands in for a draw call: succeeds when a linked program is current.
    pub fn draw(&self) -> Result<(), String> {
        let state = self.state.borrow();
        if state.current == 0 {
            return Err("no program is current".to_string());
        }
        match state.programs.get(&state.current) {
            Some(program) if program.linked => Ok(()),
            Some(_) => Err(format!("program {} is not linked", state.current)),
            None => Err(format!("program {} does not exist", state.current)),
        }
    }
}

impl ShaderBackend for HeadlessBackend {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        let mut state = self.state.borrow_mut();
        let name = state.next_name();
        state.shaders.insert(name, ShaderObject {
            stage,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
            interface: Interface::default(),
            delete_pending: false,
        });
        name
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        if let Some(object) = self.state.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        let object = match state.shaders.get_mut(&shader) {
            Some(object) => object,
            None => return,
        };
        let (errors, interface) = compile_source(&object.source);
        object.compiled = errors.is_empty();
        object.info_log = join_log(&errors);
        object.interface = interface;
        debug!("compiled {} shader {}: {}", object.stage, shader, if object.compiled { "ok" } else { "failed" });
    }

    fn compile_status(&self, shader: GLuint) -> bool {
        self.state.borrow().shaders.get(&shader).map(|s| s.compiled).unwrap_or(false)
    }

    fn shader_info_log(&self, shader: GLuint, capacity: usize) -> String {
        let state = self.state.borrow();
        state.shaders.get(&shader).map(|s| truncate_log(&s.info_log, capacity)).unwrap_or_default()
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        if state.is_attached(shader) {
            if let Some(object) = state.shaders.get_mut(&shader) {
                object.delete_pending = true;
            }
        } else {
            state.shaders.remove(&shader);
        }
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let name = state.next_name();
        state.programs.insert(name, ProgramObject::default());
        name
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get(&shader) {
            Some(object) if !object.delete_pending => {}
            _ => return,
        }
        if let Some(object) = state.programs.get_mut(&program).filter(|p| !p.delete_pending) {
            if !object.attached.contains(&shader) {
                object.attached.push(shader);
            }
        }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        self.state.borrow_mut().detach(program, shader);
    }

    fn link_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        let attached = match state.programs.get(&program) {
            Some(object) => object.attached.clone(),
            None => return,
        };
        let shaders: Vec<&ShaderObject> = attached.iter().filter_map(|s| state.shaders.get(s)).collect();
        let result = link_shaders(&shaders);

        if let Some(object) = state.programs.get_mut(&program) {
            match result {
                Ok(uniforms) => {
                    object.linked = true;
                    object.info_log.clear();
                    object.values = vec![None; uniforms.len()];
                    object.uniforms = uniforms;
                }
                Err(errors) => {
                    object.linked = false;
                    object.info_log = join_log(&errors);
                    object.uniforms.clear();
                    object.values.clear();
                }
            }
            debug!("linked program {}: {}", program, if object.linked { "ok" } else { "failed" });
        }
    }

    fn link_status(&self, program: GLuint) -> bool {
        self.state.borrow().programs.get(&program).map(|p| p.linked).unwrap_or(false)
    }

    fn program_info_log(&self, program: GLuint, capacity: usize) -> String {
        let state = self.state.borrow();
        state.programs.get(&program).map(|p| truncate_log(&p.info_log, capacity)).unwrap_or_default()
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        if program != 0 && state.current == program {
            if let Some(object) = state.programs.get_mut(&program) {
                object.delete_pending = true;
            }
        } else {
            state.destroy_program(program);
        }
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        if program != 0 {
            // GL refuses programs that failed to link and leaves the current one in place
            let usable = state.programs.get(&program).map(|p| p.linked && !p.delete_pending).unwrap_or(false);
            if !usable {
                return;
            }
        }
        let previous = state.current;
        state.current = program;
        let pending = state.programs.get(&previous).map(|p| p.delete_pending).unwrap_or(false);
        if previous != program && pending {
            state.destroy_program(previous);
        }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let state = self.state.borrow();
        match state.programs.get(&program) {
            Some(object) if object.linked => object.uniforms.iter()
                .position(|u| u.name == name)
                .map(|i| i as GLint)
                .unwrap_or(UNKNOWN_LOCATION),
            _ => UNKNOWN_LOCATION,
        }
    }

    fn uniform_1i(&self, location: GLint, value: GLint) {
        let mut state = self.state.borrow_mut();
        let program = match state.current_program() {
            Some(program) => program,
            None => return,
        };
        let index = match usize::try_from(location) {
            Ok(index) if index < program.uniforms.len() => index,
            _ => return,
        };
        let ty = program.uniforms[index].ty.as_str();
        let stored = if ty == "bool" {
            UniformValue::Bool(value != 0)
        } else if ty == "int" || ty.starts_with("sampler") {
            UniformValue::Int(value)
        } else {
            return;
        };
        program.values[index] = Some(stored);
    }

    fn uniform_1f(&self, location: GLint, value: GLfloat) {
        let mut state = self.state.borrow_mut();
        let program = match state.current_program() {
            Some(program) => program,
            None => return,
        };
        let index = match usize::try_from(location) {
            Ok(index) if index < program.uniforms.len() => index,
            _ => return,
        };
        let stored = match program.uniforms[index].ty.as_str() {
            "bool" => UniformValue::Bool(value != 0.0),
            "float" => UniformValue::Float(value),
            _ => return,
        };
        program.values[index] = Some(stored);
    }
}

fn join_log(errors: &[String]) -> String {
    let mut log = String::new();
    for error in errors {
        log.push_str(error);
        log.push('\n');
    }
    log
}

fn truncate_log(log: &str, capacity: usize) -> String {
    if capacity == 0 {
        return String::new();
    }
    let mut end = log.len().min(capacity - 1);
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

fn error_at(line: usize, message: &str) -> String {
    format!("0:{}(0): error: {}", line, message)
}

/// Replaces comments with spaces, keeping newlines so line numbers survive.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
            out.push(' ');
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = ' ';
            for next in chars.by_ref() {
                if next == '\n' {
                    out.push('\n');
                }
                if previous == '*' && next == '/' {
                    break;
                }
                previous = next;
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn compile_source(source: &str) -> (Vec<String>, Interface) {
    let code = strip_comments(source);
    let lines: Vec<&str> = code.lines().collect();
    let mut errors = Vec::new();
    let mut interface = Interface::default();

    check_version(&lines, &mut errors);

    for statement in scan_statements(&lines, &mut errors).iter().filter(|s| s.global) {
        if statement.opens_block {
            if declares_main(&statement.text) {
                interface.has_main = true;
            }
            continue;
        }
        if let Some(declaration) = parse_declaration(&statement.text) {
            match declaration {
                Ok((qualifier, variables)) => {
                    let target = match qualifier {
                        "in" => &mut interface.inputs,
                        "out" => &mut interface.outputs,
                        _ => &mut interface.uniforms,
                    };
                    target.extend(variables);
                }
                Err(message) => errors.push(error_at(statement.line, &message)),
            }
        }
    }

    (errors, interface)
}

fn check_version(lines: &[&str], errors: &mut Vec<String>) {
    let first_code = lines.iter().position(|l| !l.trim().is_empty());
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if !trimmed.starts_with("#version") {
            continue;
        }
        if Some(i) != first_code {
            errors.push(error_at(i + 1, "#version must occur before anything else"));
            continue;
        }
        let version = trimmed.split_whitespace().nth(1).unwrap_or("");
        match version.parse::<u32>() {
            Ok(number) if (100..=460).contains(&number) => {}
            _ => errors.push(error_at(i + 1, &format!("version '{}' is not supported", version))),
        }
    }
}

const EXPECTING_SEMICOLON: &str = "syntax error, unexpected end of statement, expecting ';'";

/// Text up to a `;` or a block-opening `{` at bracket depth 0, whitespace runs collapsed.
struct Statement {
    line: usize,
    text: String,
    global: bool,
    opens_block: bool,
}

/// Splits the code into statements across line breaks, checking bracket balance and terminators
/// on the way.
fn scan_statements(lines: &[&str], errors: &mut Vec<String>) -> Vec<Statement> {
    let mut statements = Vec::new();
    // '{' opens a block; '(', '[' and 'I' (an initializer list) nest inside a statement
    let mut stack: Vec<char> = Vec::new();
    let mut text = String::new();
    let mut first_line = 0;
    let mut last_line = 0;

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let number = i + 1;
        if !text.is_empty() {
            let nested = stack.iter().any(|open| *open != '{');
            if !nested && !continues_onto(&text, trimmed) {
                errors.push(error_at(last_line, EXPECTING_SEMICOLON));
                text.clear();
            } else {
                text.push(' ');
            }
        }

        for c in trimmed.chars() {
            let nested = stack.iter().any(|open| *open != '{');
            let blocks = stack.iter().filter(|open| **open == '{').count();
            match c {
                ';' if !nested => {
                    if !text.trim().is_empty() {
                        statements.push(Statement { line: first_line, text: text.trim().to_string(), global: blocks == 0, opens_block: false });
                    }
                    text.clear();
                    continue;
                }
                '{' if !nested && !text.trim_end().ends_with('=') => {
                    statements.push(Statement { line: first_line, text: text.trim().to_string(), global: blocks == 0, opens_block: true });
                    stack.push('{');
                    text.clear();
                    continue;
                }
                '{' => stack.push('I'),
                '(' | '[' => stack.push(c),
                ')' | ']' | '}' => {
                    let matches = match (c, stack.last().copied()) {
                        (')', Some('(')) | (']', Some('[')) | ('}', Some('I')) => true,
                        ('}', Some('{')) => {
                            if !text.trim().is_empty() {
                                errors.push(error_at(last_line, EXPECTING_SEMICOLON));
                                text.clear();
                            }
                            stack.pop();
                            continue;
                        }
                        _ => false,
                    };
                    if matches {
                        stack.pop();
                    } else {
                        errors.push(error_at(number, &format!("syntax error, unexpected '{}'", c)));
                    }
                }
                _ => {}
            }

            if c.is_whitespace() {
                if !text.is_empty() && !text.ends_with(' ') {
                    text.push(' ');
                }
                continue;
            }
            if text.trim().is_empty() {
                text.clear();
                first_line = number;
            }
            text.push(c);
            last_line = number;
        }
    }

    if !text.trim().is_empty() {
        errors.push(error_at(last_line, EXPECTING_SEMICOLON));
    }
    if !stack.is_empty() {
        errors.push(error_at(lines.len().max(1), "syntax error, unexpected end of file"));
    }
    statements
}

fn is_keyword(word: &str) -> bool {
    const KEYWORDS: &[&str] = &["return", "const", "uniform", "in", "out", "inout", "layout", "struct", "void", "precision", "invariant"];
    KEYWORDS.contains(&word) || CONTROL_KEYWORDS.contains(&word) || KNOWN_TYPES.contains(&word) || INTERPOLATION_QUALIFIERS.contains(&word)
}

/// Whether a statement left open at the end of a line may carry on with the line `next`. Two
/// operands meeting at a line break, like `a = b` followed by `c = d`, mean a missing `;`.
fn continues_onto(pending: &str, next: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let (last, first) = match (pending.chars().last(), next.chars().next()) {
        (Some(last), Some(first)) => (last, first),
        _ => return true,
    };
    if !(is_word(last) || last == ')' || last == ']') || !is_word(first) {
        return true;
    }
    if is_word(last) {
        let last_word = pending.rsplit(|c: char| !is_word(c)).next().unwrap_or("");
        return is_keyword(last_word);
    }
    // `if (...)`, `while (...)` and `layout(...)` headers
    let first_word = pending.split(|c: char| !is_word(c)).next().unwrap_or("");
    last == ')' && (CONTROL_KEYWORDS.contains(&first_word) || first_word == "layout")
}

fn declares_main(line: &str) -> bool {
    let spaced = line.replace('(', " ( ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();
    tokens.windows(3).any(|w| w == ["void", "main", "("])
}

/// Parses a global `in`/`out`/`uniform` declaration, without its `;`. `None` when the statement
/// isn't one.
fn parse_declaration(line: &str) -> Option<Result<(&'static str, Vec<Variable>), String>> {
    let mut rest = line;
    if rest.starts_with("layout") {
        let close = rest.find(')')?;
        rest = rest[close + 1..].trim_start();
    }
    let mut tokens = rest.split_whitespace().filter(|t| !INTERPOLATION_QUALIFIERS.contains(t));
    let qualifier = match tokens.next()? {
        "in" => "in",
        "out" => "out",
        "uniform" => "uniform",
        _ => return None,
    };

    let ty = match tokens.next() {
        Some(ty) => ty,
        None => return Some(Err("syntax error, expected a type".to_string())),
    };
    if !KNOWN_TYPES.contains(&ty) {
        return Some(Err(format!("syntax error, unexpected identifier '{}'", ty)));
    }

    let names: String = tokens.collect::<Vec<_>>().join(" ");
    let mut variables = Vec::new();
    for declarator in split_top_level(&names) {
        // drop the initializer, then any array size
        let name = declarator.split('=').next().unwrap_or("");
        let name = name.split('[').next().unwrap_or("").trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Some(Err(format!("syntax error, invalid declaration of '{}'", name)));
        }
        variables.push(Variable {
            ty: ty.to_string(),
            name: name.to_string(),
        });
    }
    Some(Ok((qualifier, variables)))
}

/// Splits on commas that aren't nested in brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Checks what a linker checks; returns the program's uniforms in location order.
fn link_shaders(shaders: &[&ShaderObject]) -> Result<Vec<Variable>, Vec<String>> {
    let mut errors = Vec::new();

    if shaders.iter().any(|s| !s.compiled) {
        errors.push("error: linking with uncompiled/unspecialized shader".to_string());
        return Err(errors);
    }

    let vertex = shaders.iter().find(|s| s.stage == ShaderStage::Vertex);
    let fragment = shaders.iter().find(|s| s.stage == ShaderStage::Fragment);
    let (vertex, fragment) = match (vertex, fragment) {
        (Some(v), Some(f)) => (v, f),
        (None, _) => return Err(vec!["error: program lacks a vertex shader".to_string()]),
        (_, None) => return Err(vec!["error: program lacks a fragment shader".to_string()]),
    };

    if !vertex.interface.has_main {
        errors.push("error: vertex shader lacks `main'".to_string());
    }
    if !fragment.interface.has_main {
        errors.push("error: fragment shader lacks `main'".to_string());
    }

    for input in &fragment.interface.inputs {
        match vertex.interface.outputs.iter().find(|o| o.name == input.name) {
            None => errors.push(format!("error: fragment shader input `{}' has no matching output in the previous stage", input.name)),
            Some(output) if output.ty != input.ty => errors.push(format!(
                "error: `{}' declared as type `{}' but outputted from vertex shader with type `{}'",
                input.name, input.ty, output.ty
            )),
            Some(_) => {}
        }
    }

    let mut uniforms: Vec<Variable> = Vec::new();
    for uniform in vertex.interface.uniforms.iter().chain(fragment.interface.uniforms.iter()) {
        match uniforms.iter().find(|u| u.name == uniform.name) {
            None => uniforms.push(uniform.clone()),
            Some(existing) if existing.ty != uniform.ty => errors.push(format!(
                "error: uniform `{}' declared as type `{}' and type `{}'",
                uniform.name, existing.ty, uniform.ty
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(uniforms)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
out vec3 colour;
uniform float scale;

void main()
{
    // pass through
    colour = aPos;
    gl_Position = vec4(aPos * scale, 1.0);
}
";

    const FRAGMENT: &str = "#version 330 core
in vec3 colour;
out vec4 FragColor;
uniform float scale;
uniform bool enabled;

void main()
{
    if (enabled)
        FragColor = vec4(colour, 1.0);
    else
        FragColor = vec4(0.0);
}
";

    fn compile(backend: &HeadlessBackend, stage: ShaderStage, source: &str) -> GLuint {
        let shader = backend.create_shader(stage);
        backend.shader_source(shader, source);
        backend.compile_shader(shader);
        shader
    }

    fn link(backend: &HeadlessBackend, vertex: &str, fragment: &str) -> GLuint {
        let vs = compile(backend, ShaderStage::Vertex, vertex);
        let fs = compile(backend, ShaderStage::Fragment, fragment);
        let program = backend.create_program();
        backend.attach_shader(program, vs);
        backend.attach_shader(program, fs);
        backend.link_program(program);
        program
    }

    #[test]
    fn valid_pair_compiles_and_links() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, VERTEX, FRAGMENT);
        assert!(backend.link_status(program), "{}", backend.program_info_log(program, 512));
        let names: Vec<String> = backend.active_uniforms(program).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["scale".to_string(), "enabled".to_string()]);
        assert_eq!(backend.uniform_location(program, "scale"), 0);
        assert_eq!(backend.uniform_location(program, "enabled"), 1);
        assert_eq!(backend.uniform_location(program, "missing"), UNKNOWN_LOCATION);
    }

    #[test]
    fn missing_semicolon_reports_line() {
        let backend = HeadlessBackend::new();
        let broken = VERTEX.replace("colour = aPos;", "colour = aPos");
        let shader = compile(&backend, ShaderStage::Vertex, &broken);
        assert!(!backend.compile_status(shader));
        let log = backend.shader_info_log(shader, 512);
        assert!(log.starts_with("0:9(0): error:"), "{}", log);
    }

    #[test]
    fn unknown_type_fails() {
        let backend = HeadlessBackend::new();
        let broken = VERTEX.replace("in vec3 aPos", "in vex3 aPos");
        let shader = compile(&backend, ShaderStage::Vertex, &broken);
        assert!(!backend.compile_status(shader));
        assert!(backend.shader_info_log(shader, 512).contains("vex3"));
    }

    #[test]
    fn version_must_come_first() {
        let backend = HeadlessBackend::new();
        let shader = compile(&backend, ShaderStage::Vertex, &format!("\n// header\nuniform float x;\n{}", VERTEX));
        assert!(!backend.compile_status(shader));
        assert!(backend.shader_info_log(shader, 512).contains("#version must occur before anything else"));

        let shader = compile(&backend, ShaderStage::Vertex, &VERTEX.replace("330", "999"));
        assert!(!backend.compile_status(shader));
    }

    #[test]
    fn unbalanced_braces_fail() {
        let backend = HeadlessBackend::new();
        let shader = compile(&backend, ShaderStage::Fragment, FRAGMENT.trim_end().trim_end_matches('}'));
        assert!(!backend.compile_status(shader));
        assert!(backend.shader_info_log(shader, 512).contains("unexpected end of file"));
    }

    #[test]
    fn mismatched_interface_fails_to_link() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, &VERTEX.replace("out vec3 colour;", "out vec2 colour;").replace("colour = aPos;", "colour = aPos.xy;"), FRAGMENT);
        assert!(!backend.link_status(program));
        assert!(backend.program_info_log(program, 512).contains("outputted from vertex shader"));
        assert_eq!(backend.uniform_location(program, "scale"), UNKNOWN_LOCATION);
    }

    #[test]
    fn empty_source_compiles_but_does_not_link() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, "", "");
        assert!(!backend.link_status(program));
        assert!(backend.program_info_log(program, 512).contains("lacks `main'"));
    }

    #[test]
    fn info_log_is_truncated_like_gl() {
        let backend = HeadlessBackend::new();
        let shader = compile(&backend, ShaderStage::Vertex, "#version 9000\nvoid main() {}");
        let full = backend.shader_info_log(shader, 4096);
        assert_eq!(backend.shader_info_log(shader, 8), full[..7].to_string());
        assert_eq!(backend.shader_info_log(shader, 0), "");
    }

    #[test]
    fn uniform_writes_respect_types_and_current_program() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, VERTEX, FRAGMENT);
        let scale = backend.uniform_location(program, "scale");

        // nothing is current yet
        backend.uniform_1f(scale, 2.0);
        assert_eq!(backend.uniform_value(program, "scale"), None);

        backend.use_program(program);
        backend.uniform_1i(scale, 3);
        assert_eq!(backend.uniform_value(program, "scale"), None);
        backend.uniform_1f(scale, 2.0);
        assert_eq!(backend.uniform_value(program, "scale"), Some(UniformValue::Float(2.0)));

        let enabled = backend.uniform_location(program, "enabled");
        backend.uniform_1i(enabled, 1);
        assert_eq!(backend.uniform_value(program, "enabled"), Some(UniformValue::Bool(true)));
        backend.uniform_1i(UNKNOWN_LOCATION, 7);
        assert!(backend.draw().is_ok());
    }

    #[test]
    fn statements_may_span_lines() {
        let backend = HeadlessBackend::new();
        let vertex = "#version 330 core
layout (location = 0)
    in vec3 aPos;
uniform float s;
void main()
{
    gl_Position = vec4(aPos, 1.0) * s
        * 2.0;
    for (int i = 0; i < 2; i++)
    {
        gl_Position.x += float(i);
    }
}
";
        let shader = compile(&backend, ShaderStage::Vertex, vertex);
        assert!(backend.compile_status(shader), "{}", backend.shader_info_log(shader, 512));
    }

    #[test]
    fn missing_semicolon_before_closing_brace() {
        let backend = HeadlessBackend::new();
        let broken = FRAGMENT.replace("FragColor = vec4(0.0);", "FragColor = vec4(0.0)");
        let shader = compile(&backend, ShaderStage::Fragment, &broken);
        assert!(!backend.compile_status(shader));
        assert!(backend.shader_info_log(shader, 512).starts_with("0:12(0): error:"), "{}", backend.shader_info_log(shader, 512));
    }

    #[test]
    fn uniform_initializers_are_not_declarators() {
        let backend = HeadlessBackend::new();
        let fragment = "#version 330 core
out vec4 FragColor;
uniform vec3 tint = vec3(1.0, 0.5, 0.2);
uniform float low = 0.1, high = max(0.5, 0.9);
uniform float weights[3] = float[3](0.2, 0.3, 0.5);
void main()
{
    FragColor = vec4(tint * (low + high + weights[0]), 1.0);
}
";
        let program = link(&backend, "#version 330 core\nvoid main()\n{\n    gl_Position = vec4(0.0);\n}\n", fragment);
        assert!(backend.link_status(program), "{}", backend.program_info_log(program, 512));
        let names: Vec<String> = backend.active_uniforms(program).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["tint", "low", "high", "weights"]);
    }

    #[test]
    fn deleting_current_program_waits_until_unbound() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, VERTEX, FRAGMENT);
        backend.use_program(program);
        backend.delete_program(program);

        // still current and usable, like a GL program flagged for deletion
        assert_eq!(backend.current_program(), program);
        assert_eq!(backend.live_programs(), 1);
        assert!(backend.draw().is_ok());
        backend.use_program(program);
        assert_eq!(backend.live_programs(), 1);

        backend.use_program(0);
        assert_eq!(backend.current_program(), 0);
        assert_eq!(backend.live_programs(), 0);
        assert!(backend.draw().is_err());
    }

    #[test]
    fn deleting_attached_shader_waits_until_detached() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, VERTEX, FRAGMENT);
        let (vs, fs) = (1, 2);
        backend.delete_shader(vs);
        backend.delete_shader(fs);
        assert_eq!(backend.live_shaders(), 2);

        backend.detach_shader(program, vs);
        assert_eq!(backend.live_shaders(), 1);
        // deleting the program releases what is still attached
        backend.delete_program(program);
        assert_eq!(backend.live_shaders(), 0);
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn deleting_detached_shader_is_immediate() {
        let backend = HeadlessBackend::new();
        let program = link(&backend, VERTEX, FRAGMENT);
        backend.detach_shader(program, 1);
        backend.delete_shader(1);
        assert_eq!(backend.live_shaders(), 1);
        assert!(backend.link_status(program));
    }
}
