// Mock entity services.
// In-memory CRUD collaborators views fetch from before pushing into the cache.

pub mod branch;
pub mod product;
pub mod sales;
pub mod user;

pub use branch::{Branch, BranchService};
pub use product::{Product, ProductService};
pub use sales::{CartItem, Sale, SaleStatus, checkout};
pub use user::{Role, User, UserService};
