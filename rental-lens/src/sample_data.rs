//! A miniature DVD-rental dataset.
//!
//! Thirteen CSV files following the canonical schema, small enough to read at
//! a glance yet complete enough for every catalog query to return rows. Used
//! by the `init-sample` command and by the test suites.

use crate::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `(file name, contents)` of every sample file, in file name order.
pub const SAMPLE_FILES: &[(&str, &str)] = &[
    ("actor.csv", ACTOR),
    ("address.csv", ADDRESS),
    ("category.csv", CATEGORY),
    ("city.csv", CITY),
    ("customer.csv", CUSTOMER),
    ("film.csv", FILM),
    ("film_actor.csv", FILM_ACTOR),
    ("film_category.csv", FILM_CATEGORY),
    ("inventory.csv", INVENTORY),
    ("payment.csv", PAYMENT),
    ("rental.csv", RENTAL),
    ("staff.csv", STAFF),
    ("store.csv", STORE),
];

const ACTOR: &str = "\
actor_id,first_name,last_name,last_update
1,Penelope,Guiness,2006-02-15 04:34:33
2,Nick,Wahlberg,2006-02-15 04:34:33
3,Ed,Chase,2006-02-15 04:34:33
4,Jennifer,Davis,2006-02-15 04:34:33
";

const ADDRESS: &str = "\
address_id,address,district,city_id,postal_code,phone,last_update
1,47 MySakila Drive,Alberta,1,,,2006-02-15 09:45:30
2,28 MySQL Boulevard,QLD,2,,,2006-02-15 09:45:30
3,23 Workhaven Lane,Alberta,1,,14033335568,2006-02-15 09:45:30
4,1411 Lillydale Drive,QLD,2,,6172235589,2006-02-15 09:45:30
5,1913 Hanoi Way,Nagasaki,3,35200,28303384290,2006-02-15 09:45:30
6,1121 Loja Avenue,California,2,17886,838635286649,2006-02-15 09:45:30
";

const CATEGORY: &str = "\
category_id,name,last_update
1,Action,2006-02-15 09:46:27
2,Animation,2006-02-15 09:46:27
3,Children,2006-02-15 09:46:27
4,Classics,2006-02-15 09:46:27
5,Comedy,2006-02-15 09:46:27
6,Family,2006-02-15 09:46:27
7,Music,2006-02-15 09:46:27
8,Horror,2006-02-15 09:46:27
";

const CITY: &str = "\
city_id,city,country_id,last_update
1,Lethbridge,20,2006-02-15 09:45:25
2,Woodridge,8,2006-02-15 09:45:25
3,Sasebo,50,2006-02-15 09:45:25
";

const CUSTOMER: &str = "\
customer_id,store_id,first_name,last_name,email,address_id,activebool,create_date,last_update,active
1,1,Mary,Smith,mary.smith@sakilacustomer.org,5,true,2006-02-14,2013-05-26 14:49:45.738,1
2,1,Patricia,Johnson,patricia.johnson@sakilacustomer.org,6,true,2006-02-14,2013-05-26 14:49:45.738,1
3,2,Linda,Williams,linda.williams@sakilacustomer.org,5,true,2006-02-14,2013-05-26 14:49:45.738,1
4,2,Barbara,Jones,barbara.jones@sakilacustomer.org,6,true,2006-02-14,2013-05-26 14:49:45.738,1
";

const FILM: &str = "\
film_id,title,description,release_year,language_id,rental_duration,rental_rate,length,replacement_cost,rating,last_update
1,Academy Dinosaur,A Epic Drama of a Feminist,2006,1,6,0.99,86,20.99,PG,2013-05-26 14:50:58.951
2,Ace Goldfinger,A Astounding Epistle of a Database Administrator,2006,1,3,4.99,48,12.99,G,2013-05-26 14:50:58.951
3,Adaptation Holes,A Astounding Reflection of a Lumberjack,2006,1,7,2.99,50,18.99,NC-17,2013-05-26 14:50:58.951
4,Affair Prejudice,A Fanciful Documentary of a Frisbee,2006,1,5,2.99,117,26.99,G,2013-05-26 14:50:58.951
5,African Egg,A Fast-Paced Documentary of a Pastry Chef,2006,1,6,2.99,130,22.99,G,2013-05-26 14:50:58.951
6,Agent Truman,A Intrepid Panorama of a Robot,2006,1,3,2.99,169,17.99,PG,2013-05-26 14:50:58.951
7,Airplane Sierra,A Touching Saga of a Hunter,2006,1,4,4.99,62,28.99,PG-13,2013-05-26 14:50:58.951
8,Airport Pollock,A Epic Tale of a Moose,2006,1,5,4.99,54,15.99,R,2013-05-26 14:50:58.951
";

const FILM_ACTOR: &str = "\
actor_id,film_id,last_update
1,1,2006-02-15 05:05:03
1,8,2006-02-15 05:05:03
2,2,2006-02-15 05:05:03
2,3,2006-02-15 05:05:03
3,1,2006-02-15 05:05:03
3,5,2006-02-15 05:05:03
4,6,2006-02-15 05:05:03
4,7,2006-02-15 05:05:03
";

const FILM_CATEGORY: &str = "\
film_id,category_id,last_update
1,6,2006-02-15 05:07:09
2,2,2006-02-15 05:07:09
3,3,2006-02-15 05:07:09
4,5,2006-02-15 05:07:09
5,1,2006-02-15 05:07:09
6,7,2006-02-15 05:07:09
7,4,2006-02-15 05:07:09
8,8,2006-02-15 05:07:09
";

const INVENTORY: &str = "\
inventory_id,film_id,store_id,last_update
1,1,1,2006-02-15 05:09:17
2,1,2,2006-02-15 05:09:17
3,2,1,2006-02-15 05:09:17
4,3,2,2006-02-15 05:09:17
5,4,1,2006-02-15 05:09:17
6,5,2,2006-02-15 05:09:17
7,6,1,2006-02-15 05:09:17
8,7,2,2006-02-15 05:09:17
9,8,1,2006-02-15 05:09:17
10,2,2,2006-02-15 05:09:17
";

const PAYMENT: &str = "\
payment_id,customer_id,staff_id,rental_id,amount,payment_date
1,1,1,1,2.99,2007-02-15 22:25:46.996577
2,1,1,2,0.99,2007-02-16 17:23:14.996577
3,2,2,3,5.99,2007-02-16 22:41:45.996577
4,2,1,4,0.99,2007-03-01 01:02:03.996577
5,3,2,5,9.99,2007-03-02 10:30:00
6,1,1,6,4.99,2007-03-18 12:00:00
7,3,2,7,2.99,2007-03-21 13:14:15
8,2,2,8,4.99,2007-04-05 09:00:00
9,1,1,9,7.99,2007-04-06 10:00:00
10,3,2,10,0.99,2007-04-07 11:00:00
11,2,1,11,3.99,2007-04-08 12:00:00
12,3,2,12,1.99,2007-04-09 13:00:00
";

const RENTAL: &str = "\
rental_id,rental_date,inventory_id,customer_id,return_date,staff_id,last_update
1,2005-05-24 22:53:30,1,1,2005-05-26 22:04:30,1,2006-02-15 21:30:53
2,2005-05-24 22:54:33,3,1,2005-05-28 19:40:33,1,2006-02-15 21:30:53
3,2005-05-24 23:03:39,4,2,2005-06-01 22:12:39,2,2006-02-15 21:30:53
4,2005-05-25 00:00:40,5,2,2005-05-28 00:22:40,1,2006-02-15 21:30:53
5,2005-06-14 23:07:08,6,3,2005-06-17 02:11:08,2,2006-02-15 21:30:53
6,2005-06-15 00:45:21,7,1,2005-06-19 20:31:21,1,2006-02-15 21:30:53
7,2005-06-16 10:12:00,2,3,2005-06-20 10:00:00,2,2006-02-15 21:30:53
8,2005-07-05 09:30:00,8,2,2005-07-08 11:00:00,2,2006-02-15 21:30:53
9,2005-07-06 14:20:00,9,1,2005-07-10 15:00:00,1,2006-02-15 21:30:53
10,2005-07-28 16:45:00,10,3,2005-07-30 12:00:00,2,2006-02-15 21:30:53
11,2005-08-01 08:00:00,1,2,2005-08-05 09:00:00,1,2006-02-15 21:30:53
12,2006-02-14 15:16:03,3,3,,2,2006-02-16 02:30:53
";

const STAFF: &str = "\
staff_id,first_name,last_name,address_id,email,store_id,active,username,last_update
1,Mike,Hillyer,3,Mike.Hillyer@sakilastaff.com,1,true,Mike,2006-02-15 03:57:16
2,Jon,Stephens,4,Jon.Stephens@sakilastaff.com,2,true,Jon,2006-02-15 03:57:16
";

const STORE: &str = "\
store_id,manager_staff_id,address_id,last_update
1,1,1,2006-02-15 09:57:12
2,2,2,2006-02-15 09:57:12
";

/// Writes the sample files into `dir`, creating it if needed and overwriting
/// files of the same name. Returns the written paths.
pub fn write_sample_dataset(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(SAMPLE_FILES.len());
    for (name, contents) in SAMPLE_FILES {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "Wrote sample dataset");
    Ok(written)
}
