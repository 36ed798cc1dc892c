pub mod todo;

pub use todo::{CreateTodoRequest, Todo, TodoList, TodoResponse, UpdateTodoRequest};
