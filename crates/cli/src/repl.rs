// Lua Sub-REPL
//
// One Lua state lives for the whole editor run. Before each line the active
// sheet is snapshotted into shared state; the `sheet.*` functions read that
// snapshot and record writes as ops. Ops reach the session only after the
// chunk returns without error.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::{Function, Lua, MultiValue, Result as LuaResult, Value as LuaValue, Variadic};
use termsheet_core::session::Session;
use termsheet_engine::address::CellAddr;
use termsheet_engine::cell::CellValue;
use termsheet_engine::formula::eval::{format_number, Value};
use termsheet_engine::sheet::Sheet;

const CHUNK_NAME: &str = "repl";

#[derive(Debug, Clone, PartialEq)]
enum ReplOp {
    Set { addr: CellAddr, input: String },
    Goto(CellAddr),
}

#[derive(Default)]
struct ReplState {
    sheet: Sheet,
    /// Cursor label, e.g. `B7`
    cursor: String,
    sheet_names: Vec<String>,
    ops: Vec<ReplOp>,
    output: Vec<String>,
}

pub struct Repl {
    lua: Lua,
    state: Rc<RefCell<ReplState>>,
}

impl Repl {
    pub fn new() -> Result<Self, String> {
        let lua = Lua::new();
        let state = Rc::new(RefCell::new(ReplState::default()));
        register_api(&lua, state.clone()).map_err(|e| format!("Lua setup error: {}", e))?;
        Ok(Self { lua, state })
    }

    /// Run one line against `session`. Output, results, and errors all end up
    /// in the session's message log.
    pub fn run_line(&self, session: &mut Session, line: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.sheet = session.workbook().active_sheet().clone();
            state.cursor = session.cursor().to_string();
            state.sheet_names = session.workbook().sheet_names().into_iter().map(str::to_string).collect();
            state.ops.clear();
            state.output.clear();
        }

        let result = self.compile(line).and_then(|chunk| chunk.call::<MultiValue>(()));

        let (ops, output) = {
            let mut state = self.state.borrow_mut();
            (std::mem::take(&mut state.ops), std::mem::take(&mut state.output))
        };
        for text in output {
            session.say(text);
        }

        match result {
            Ok(values) => {
                for op in ops {
                    match op {
                        ReplOp::Set { addr, input } => session.set_cell_input(addr, &input),
                        ReplOp::Goto(addr) => session.goto(addr),
                    }
                }
                if !values.is_empty() {
                    let shown: Vec<String> = values.iter().map(describe).collect();
                    session.say(shown.join("\t"));
                }
            }
            Err(e) => {
                let detail = e.to_string();
                let detail = detail.lines().next().unwrap_or("").to_string();
                tracing::warn!("repl line failed: {}", detail);
                session.say(format!("lua error: {}", detail));
            }
        }
    }

    /// Compile `return <line>` so bare expressions echo; fall back to the
    /// line as a statement.
    fn compile(&self, line: &str) -> LuaResult<Function> {
        let expression = format!("return {}", line);
        match self.lua.load(expression.as_str()).set_name(CHUNK_NAME).into_function() {
            Ok(chunk) => Ok(chunk),
            Err(_) => self.lua.load(line).set_name(CHUNK_NAME).into_function(),
        }
    }
}

fn register_api(lua: &Lua, state: Rc<RefCell<ReplState>>) -> LuaResult<()> {
    // print(...) goes to the message log
    {
        let state = state.clone();
        let print_fn = lua.create_function(move |_, args: Variadic<LuaValue>| {
            let parts: Vec<String> = args.iter().map(describe).collect();
            state.borrow_mut().output.push(parts.join("\t"));
            Ok(())
        })?;
        lua.globals().set("print", print_fn)?;
    }

    let sheet = lua.create_table()?;

    // sheet.get("A1") -> displayed value
    {
        let state = state.clone();
        let get_fn = lua.create_function(move |lua, addr: String| {
            let addr = parse_addr(&addr)?;
            let value = state.borrow().sheet.display_value(addr);
            to_lua(lua, value)
        })?;
        sheet.set("get", get_fn)?;
    }

    // sheet.formula("A1") -> source or nil
    {
        let state = state.clone();
        let formula_fn = lua.create_function(move |_, addr: String| {
            let addr = parse_addr(&addr)?;
            let state = state.borrow();
            Ok(state.sheet.get_cell(addr).formula_source().map(|s| format!("={}", s)))
        })?;
        sheet.set("formula", formula_fn)?;
    }

    // sheet.set("A1", value); strings starting with '=' are formulas
    {
        let state = state.clone();
        let set_fn = lua.create_function(move |_, (addr, value): (String, LuaValue)| {
            let addr = parse_addr(&addr)?;
            let input = input_text(&value)?;
            let mut state = state.borrow_mut();
            state.sheet.set_cell(addr, CellValue::from_input(&input));
            state.ops.push(ReplOp::Set { addr, input });
            Ok(())
        })?;
        sheet.set("set", set_fn)?;
    }

    // sheet.goto("B7")
    {
        let state = state.clone();
        let goto_fn = lua.create_function(move |_, addr: String| {
            let addr = parse_addr(&addr)?;
            let mut state = state.borrow_mut();
            state.cursor = addr.to_string();
            state.ops.push(ReplOp::Goto(addr));
            Ok(())
        })?;
        sheet.set("goto", goto_fn)?;
    }

    {
        let state = state.clone();
        let cursor_fn = lua.create_function(move |_, ()| Ok(state.borrow().cursor.clone()))?;
        sheet.set("cursor", cursor_fn)?;
    }

    {
        let sheets_fn = lua.create_function(move |_, ()| Ok(state.borrow().sheet_names.clone()))?;
        sheet.set("sheets", sheets_fn)?;
    }

    lua.globals().set("sheet", sheet)?;
    Ok(())
}

fn parse_addr(label: &str) -> LuaResult<CellAddr> {
    CellAddr::parse(label).map_err(|e| mlua::Error::external(e.to_string()))
}

fn to_lua(lua: &Lua, value: Value) -> LuaResult<LuaValue> {
    Ok(match value {
        Value::Empty => LuaValue::Nil,
        Value::Number(n) => LuaValue::Number(n),
        Value::Boolean(b) => LuaValue::Boolean(b),
        other => LuaValue::String(lua.create_string(other.to_text())?),
    })
}

/// Editor input equivalent of a Lua value; nil clears the cell.
fn input_text(value: &LuaValue) -> LuaResult<String> {
    match value {
        LuaValue::Nil => Ok(String::new()),
        LuaValue::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        LuaValue::Integer(i) => Ok(i.to_string()),
        LuaValue::Number(n) => Ok(format_number(*n)),
        LuaValue::String(s) => Ok(s.to_string_lossy()),
        other => Err(mlua::Error::external(format!("cannot store a {} in a cell", other.type_name()))),
    }
}

fn describe(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => "nil".to_string(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => format_number(*n),
        LuaValue::String(s) => s.to_string_lossy(),
        other => format!("<{}>", other.type_name()),
    }
}
