use crate::prelude::*;

/// Renders expressions as s-expressions. Diagnostic aid, not part of the
/// normal pipeline.
#[allow(unused)]
pub struct AstPrinter;

impl AstPrinter {
    #[allow(unused)]
    pub fn to_string(expr: &Expr) -> String {
        match expr {
            Expr::Binary { left, operator, right } => {
                format!(
                    "({} {} {})",
                    operator.lexeme,
                    Self::to_string(left),
                    Self::to_string(right)
                )
            }
            Expr::Logical { left, operator, right } => {
                format!(
                    "({} {} {})",
                    operator.lexeme,
                    Self::to_string(left),
                    Self::to_string(right)
                )
            }
            Expr::Ternary { condition, then_branch, else_branch } => {
                format!(
                    "(?: {} {} {})",
                    Self::to_string(condition),
                    Self::to_string(then_branch),
                    Self::to_string(else_branch)
                )
            }
            Expr::Grouping { expr } => format!("(group {})", Self::to_string(expr)),
            Expr::Literal { value } => format!("{value}"),
            Expr::Unary { operator, right, postfix } => {
                if *postfix {
                    format!("({} {} postfix)", operator.lexeme, Self::to_string(right))
                } else {
                    format!("({} {})", operator.lexeme, Self::to_string(right))
                }
            }
            Expr::Variable { name } => name.lexeme.clone(),
            Expr::Assignment { name, value } => {
                format!("(= {} {})", name.lexeme, Self::to_string(value))
            }
            Expr::Call { callee, paren: _, arguments } => {
                let args = arguments.iter().map(Self::to_string).collect::<Vec<_>>().join(" ");
                format!("(call {} {})", Self::to_string(callee), args)
            }
            Expr::Get { object, name } => {
                format!("(. {} {})", Self::to_string(object), name.lexeme)
            }
            Expr::Set { object, name, value } => {
                format!(
                    "(.= {} {} {})",
                    Self::to_string(object),
                    name.lexeme,
                    Self::to_string(value)
                )
            }
            Expr::Index { target, bracket: _, index } => {
                let index = index.as_ref().map(|i| Self::to_string(i)).unwrap_or_default();
                format!("([] {} {})", Self::to_string(target), index)
            }
            Expr::ArraySet { target, bracket: _, index, value } => {
                let index = index.as_ref().map(|i| Self::to_string(i)).unwrap_or_default();
                format!(
                    "([]= {} {} {})",
                    Self::to_string(target),
                    index,
                    Self::to_string(value)
                )
            }
            Expr::ArrayLiteral { bracket: _, items } => {
                let items = items.iter().map(Self::to_string).collect::<Vec<_>>().join(" ");
                format!("(array {})", items)
            }
            Expr::Lambda { params, .. } => {
                let params = params.iter().map(|p| p.lexeme.clone()).collect::<Vec<_>>().join(" ");
                format!("(fun ({}))", params)
            }
            Expr::This { keyword } => keyword.lexeme.clone(),
            Expr::Super { keyword, method } => format!("({}.{})", keyword.lexeme, method.lexeme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn print_an_ast() {
        // This is '-123 * (45.67)'
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::Minus, "-", None, 1),
                right: Box::new(Expr::number_literal(123.0)),
                postfix: false,
            }),
            operator: Token::new(TokenType::Star, "*", None, 1),
            right: Box::new(Expr::Grouping { expr: Box::new(Expr::number_literal(45.67)) }),
        };

        let res = AstPrinter::to_string(&expr);
        assert_eq!(res, "(* (- 123) (group 45.67))".to_owned());
    }
}
