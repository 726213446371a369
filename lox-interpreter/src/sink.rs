use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

/// Where `print` statements go. One call per printed value, without the
/// trailing newline.
pub trait PrintSink {
    fn print(&mut self, text: &str) -> io::Result<()>;
}

impl PrintSink for io::Stdout {
    fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.lock(), "{}", text)
    }
}

impl PrintSink for Vec<String> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.push(text.to_string());
        Ok(())
    }
}

// lets the caller keep a handle on a sink the interpreter owns
impl<S: PrintSink> PrintSink for Rc<RefCell<S>> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.borrow_mut().print(text)
    }
}
