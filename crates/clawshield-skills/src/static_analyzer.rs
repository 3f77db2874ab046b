//! Static Code Analyzer: an AST-driven scan for dangerous calls, imports,
//! sandbox-escape vectors, and obfuscated literals. Parsing and tree-walking are
//! provided by `oxc`; the vulnerability rule table below is this crate's own.

use clawshield_firewall::Severity;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, Expression, MemberExpression, Statement};
use oxc_ast::visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, Span, SourceType};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{StaticAnalysisResult, Vulnerability, VulnerabilityKind};

const DANGEROUS_IMPORT_MODULES: [&str; 6] = ["child_process", "cluster", "dgram", "dns", "net", "tls"];
const FS_MODULES: [&str; 2] = ["fs", "fs/promises"];

fn strip_node_prefix(module: &str) -> &str {
    module.strip_prefix("node:").unwrap_or(module)
}

fn hex_literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]+$").expect("hex regex must compile"))
}

fn base64_literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/]+=*$").expect("base64 regex must compile"))
}

fn unicode_escape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\u[0-9a-fA-F]{4}").expect("unicode escape regex must compile"))
}

/// 1-indexed (line, column) of a byte offset into `source`, counting columns in chars.
fn line_column(source: &str, offset: u32) -> (u32, u32) {
    let offset = offset as usize;
    let mut line = 1u32;
    let mut column = 1u32;
    for ch in source[..offset.min(source.len())].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

pub struct StaticAnalyzer;

impl StaticAnalyzer {
    pub fn analyze(code: &str) -> StaticAnalysisResult {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let parsed = Parser::new(&allocator, code, source_type).parse();

        if parsed.panicked || !parsed.errors.is_empty() {
            return StaticAnalysisResult {
                vulnerabilities: vec![Vulnerability {
                    kind: VulnerabilityKind::ParseError,
                    severity: Severity::Info,
                    line: None,
                    column: None,
                    detail: None,
                }],
                severity: Severity::Info,
                patterns: vec!["Parse error - code may be obfuscated".to_string()],
            };
        }

        let mut visitor = RuleVisitor {
            source: code,
            vulnerabilities: Vec::new(),
        };
        for stmt in &parsed.program.body {
            visitor.visit_statement(stmt);
        }

        let severity = visitor
            .vulnerabilities
            .iter()
            .map(|v| v.severity)
            .max()
            .unwrap_or(Severity::Info);
        let patterns = visitor
            .vulnerabilities
            .iter()
            .map(|v| format!("{:?}", v.kind))
            .collect();

        StaticAnalysisResult {
            vulnerabilities: visitor.vulnerabilities,
            severity,
            patterns,
        }
    }
}

struct RuleVisitor<'a> {
    source: &'a str,
    vulnerabilities: Vec<Vulnerability>,
}

impl<'a> RuleVisitor<'a> {
    fn push(&mut self, kind: VulnerabilityKind, severity: Severity, span: Span, detail: Option<String>) {
        let (line, column) = line_column(self.source, span.start);
        self.vulnerabilities.push(Vulnerability {
            kind,
            severity,
            line: Some(line),
            column: Some(column),
            detail,
        });
    }

    fn callee_name<'b>(&self, expr: &'b Expression<'b>) -> Option<&'b str> {
        match expr {
            Expression::Identifier(ident) => Some(ident.name.as_str()),
            _ => None,
        }
    }

    fn first_string_literal<'b>(&self, args: &'b oxc_allocator::Vec<'b, Argument<'b>>) -> Option<String> {
        args.first().and_then(|arg| match arg {
            Argument::StringLiteral(lit) => Some(lit.value.as_str().to_string()),
            _ => None,
        })
    }

    fn check_string_literal_obfuscation(&mut self, value: &str, span: Span) {
        let start = span.start as usize;
        let end = span.end as usize;
        let raw = self.source.get(start..end).unwrap_or("");

        let is_hex_shaped = value.len() >= 30 && hex_literal_regex().is_match(value);
        let is_base64_shaped = value.len() >= 50 && base64_literal_regex().is_match(value);
        let escape_count = unicode_escape_regex().find_iter(raw).count();

        if is_hex_shaped || is_base64_shaped || escape_count >= 5 {
            self.push(VulnerabilityKind::Obfuscation, Severity::Medium, span, None);
        }
    }
}

impl<'a> Visit<'a> for RuleVisitor<'a> {
    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        if matches!(stmt, Statement::WithStatement(_)) {
            self.push(VulnerabilityKind::SandboxEscape, Severity::Critical, stmt.span(), None);
        }
        walk::walk_statement(self, stmt);
    }

    fn visit_string_literal(&mut self, lit: &oxc_ast::ast::StringLiteral<'a>) {
        self.check_string_literal_obfuscation(lit.value.as_str(), lit.span());
    }

    fn visit_call_expression(&mut self, call: &oxc_ast::ast::CallExpression<'a>) {
        let span = call.span();
        if let Some(name) = self.callee_name(&call.callee) {
            match name {
                "eval" => self.push(VulnerabilityKind::DangerousFunction, Severity::Critical, span, None),
                "Function" | "setTimeout" | "setInterval" => {
                    self.push(VulnerabilityKind::DangerousFunction, Severity::High, span, None)
                }
                "require" => {
                    if let Some(literal) = self.first_string_literal(&call.arguments) {
                        let bare = strip_node_prefix(&literal);
                        if DANGEROUS_IMPORT_MODULES.contains(&bare) {
                            self.push(
                                VulnerabilityKind::DangerousModule,
                                Severity::Critical,
                                span,
                                Some(literal),
                            );
                        } else if FS_MODULES.contains(&bare) {
                            self.push(
                                VulnerabilityKind::FilesystemAccess,
                                Severity::High,
                                span,
                                Some(literal),
                            );
                        }
                    }
                }
                "fetch" => {
                    if let Some(url) = self.first_string_literal(&call.arguments) {
                        self.push(VulnerabilityKind::NetworkRequest, Severity::Medium, span, Some(url));
                    } else {
                        self.push(VulnerabilityKind::NetworkRequest, Severity::High, span, None);
                    }
                }
                _ => {}
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_new_expression(&mut self, new_expr: &oxc_ast::ast::NewExpression<'a>) {
        let span = new_expr.span();
        if let Some(name) = self.callee_name(&new_expr.callee) {
            match name {
                "Function" => self.push(VulnerabilityKind::DangerousFunction, Severity::Critical, span, None),
                "Proxy" | "Reflect" => {
                    self.push(VulnerabilityKind::SandboxEscape, Severity::Critical, span, None)
                }
                _ => {}
            }
        }
        walk::walk_new_expression(self, new_expr);
    }

    fn visit_import_expression(&mut self, import_expr: &oxc_ast::ast::ImportExpression<'a>) {
        self.push(
            VulnerabilityKind::DynamicImport,
            Severity::Critical,
            import_expr.span(),
            None,
        );
        walk::walk_import_expression(self, import_expr);
    }

    fn visit_import_declaration(&mut self, decl: &oxc_ast::ast::ImportDeclaration<'a>) {
        let span = decl.span();
        let source = decl.source.value.as_str();
        let bare = strip_node_prefix(source);
        if DANGEROUS_IMPORT_MODULES.contains(&bare) {
            self.push(
                VulnerabilityKind::DangerousModule,
                Severity::Critical,
                span,
                Some(source.to_string()),
            );
        } else if FS_MODULES.contains(&bare) {
            self.push(
                VulnerabilityKind::FilesystemAccess,
                Severity::High,
                span,
                Some(source.to_string()),
            );
        }
        walk::walk_import_declaration(self, decl);
    }

    fn visit_member_expression(&mut self, member: &MemberExpression<'a>) {
        match member {
            MemberExpression::StaticMemberExpression(inner) => {
                let span = inner.span();
                let property = inner.property.name.as_str();
                let object_name = self.callee_name(&inner.object);

                if matches!(property, "constructor" | "__proto__" | "prototype") {
                    self.push(VulnerabilityKind::SandboxEscape, Severity::Critical, span, None);
                }
                if property == "callee" && object_name == Some("arguments") {
                    self.push(VulnerabilityKind::SandboxEscape, Severity::Critical, span, None);
                }
                if property == "env" && object_name == Some("process") {
                    self.push(VulnerabilityKind::EnvAccess, Severity::High, span, None);
                }
                if matches!(object_name, Some("Proxy") | Some("Reflect")) {
                    self.push(VulnerabilityKind::SandboxEscape, Severity::Critical, span, None);
                }
            }
            MemberExpression::ComputedMemberExpression(_) | MemberExpression::PrivateFieldExpression(_) => {}
        }
        walk::walk_member_expression(self, member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_call_is_critical() {
        let result = StaticAnalyzer::analyze("function run(c){return eval(c);}");
        assert_eq!(result.severity, Severity::Critical);
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::DangerousFunction));
    }

    #[test]
    fn benign_code_has_no_vulnerabilities() {
        let result = StaticAnalyzer::analyze("const arr = [1,2,3].map(n => n*2);");
        assert!(result.vulnerabilities.is_empty());
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn sandbox_escape_via_constructor_chain() {
        let result = StaticAnalyzer::analyze("const c = globalThis.constructor;");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::SandboxEscape));
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn dangerous_module_require_is_critical() {
        let result = StaticAnalyzer::analyze("const cp = require('child_process');");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::DangerousModule));
    }

    #[test]
    fn fs_require_is_filesystem_access() {
        let result = StaticAnalyzer::analyze("const fs = require('fs');");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::FilesystemAccess && v.severity == Severity::High));
    }

    #[test]
    fn fetch_with_literal_url_is_medium() {
        let result = StaticAnalyzer::analyze("fetch('https://example.com');");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::NetworkRequest && v.severity == Severity::Medium));
    }

    #[test]
    fn fetch_with_dynamic_url_is_high() {
        let result = StaticAnalyzer::analyze("fetch(url);");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::NetworkRequest && v.severity == Severity::High));
    }

    #[test]
    fn with_statement_is_sandbox_escape() {
        let result = StaticAnalyzer::analyze("with (obj) { x = 1; }");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::SandboxEscape));
    }

    #[test]
    fn dynamic_import_is_critical() {
        let result = StaticAnalyzer::analyze("import('./module.js');");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::DynamicImport));
    }

    #[test]
    fn process_env_access_is_high() {
        let result = StaticAnalyzer::analyze("const key = process.env.SECRET;");
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::EnvAccess));
    }

    #[test]
    fn vulnerability_location_points_at_the_offending_line() {
        let result = StaticAnalyzer::analyze("const x = 1;\nconst cp = require('child_process');");
        let vuln = result
            .vulnerabilities
            .iter()
            .find(|v| v.kind == VulnerabilityKind::DangerousModule)
            .expect("dangerous module vulnerability");
        assert_eq!(vuln.line, Some(2));
        assert_eq!(vuln.column, Some(12));
    }

    #[test]
    fn parse_error_never_escalates_past_info() {
        let result = StaticAnalyzer::analyze("function broken( {{{");
        assert_eq!(result.severity, Severity::Info);
        assert_eq!(result.vulnerabilities.len(), 1);
        assert_eq!(result.vulnerabilities[0].kind, VulnerabilityKind::ParseError);
    }

    #[test]
    fn obfuscated_hex_string_literal_is_flagged() {
        let hex = "a".repeat(32);
        let code = format!("const x = '{hex}';");
        let result = StaticAnalyzer::analyze(&code);
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.kind == VulnerabilityKind::Obfuscation));
    }

    #[test]
    fn severity_is_max_of_reported_vulnerabilities() {
        let code = "fetch('https://example.com'); const key = process.env.SECRET;";
        let result = StaticAnalyzer::analyze(code);
        assert_eq!(result.severity, Severity::High);
    }
}
