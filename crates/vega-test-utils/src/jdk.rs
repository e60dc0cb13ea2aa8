//! Library stubs resolved alongside every fixture.
//!
//! Only signatures matter; bodies are omitted. The stubs are parsed by the same
//! fixture parser, so they stay within its subset.

pub const JAVA_LANG: &str = r#"
package java.lang;

public class Object {
    public Object() {}
    public boolean equals(Object obj);
    public int hashCode();
    public String toString();
    public final Class<?> getClass();
}

public final class Class<T> {
    public String getName();
    public String getSimpleName();
}

public interface CharSequence {
    int length();
    char charAt(int index);
}

public interface Comparable<T> {
    int compareTo(T o);
}

public interface Runnable {
    void run();
}

public interface Iterable<T> {
    java.util.Iterator<T> iterator();
    default void forEach(java.util.function.Consumer<? super T> action);
}

public interface AutoCloseable {
    void close() throws Exception;
}

public interface Cloneable {
}

public final class String implements CharSequence, Comparable<String> {
    public String() {}
    public String(String original) {}
    public int length();
    public char charAt(int index);
    public boolean isEmpty();
    public String substring(int beginIndex);
    public String substring(int beginIndex, int endIndex);
    public String trim();
    public String toUpperCase();
    public String toLowerCase();
    public String concat(String str);
    public boolean startsWith(String prefix);
    public boolean contains(CharSequence s);
    public int indexOf(String str);
    public int compareTo(String other);
    public String[] split(String regex);
    public static String valueOf(Object obj);
    public static String valueOf(int i);
    public static String format(String format, Object... args);
    public static String join(CharSequence delimiter, CharSequence... elements);
}

public final class StringBuilder implements CharSequence {
    public StringBuilder() {}
    public StringBuilder(String str) {}
    public StringBuilder append(String str);
    public StringBuilder append(int i);
    public StringBuilder append(Object obj);
    public int length();
    public char charAt(int index);
    public String toString();
}

public abstract class Number {
    public abstract int intValue();
    public abstract long longValue();
    public abstract double doubleValue();
}

public final class Integer extends Number implements Comparable<Integer> {
    public static final int MAX_VALUE = 2147483647;
    public static final int MIN_VALUE = -2147483648;
    public Integer(int value) {}
    public int intValue();
    public long longValue();
    public double doubleValue();
    public int compareTo(Integer other);
    public static int parseInt(String s);
    public static Integer valueOf(int i);
    public static int compare(int x, int y);
    public static int sum(int a, int b);
    public static int max(int a, int b);
    public static String toString(int i);
}

public final class Long extends Number implements Comparable<Long> {
    public static final long MAX_VALUE = 9223372036854775807L;
    public int intValue();
    public long longValue();
    public double doubleValue();
    public int compareTo(Long other);
    public static long parseLong(String s);
    public static Long valueOf(long l);
}

public final class Double extends Number implements Comparable<Double> {
    public int intValue();
    public long longValue();
    public double doubleValue();
    public int compareTo(Double other);
    public static double parseDouble(String s);
    public static Double valueOf(double d);
}

public final class Float extends Number {
    public int intValue();
    public long longValue();
    public double doubleValue();
}

public final class Short extends Number {
    public int intValue();
    public long longValue();
    public double doubleValue();
}

public final class Byte extends Number {
    public int intValue();
    public long longValue();
    public double doubleValue();
}

public final class Boolean implements Comparable<Boolean> {
    public static final Boolean TRUE = null;
    public static final Boolean FALSE = null;
    public boolean booleanValue();
    public int compareTo(Boolean other);
    public static boolean parseBoolean(String s);
    public static Boolean valueOf(boolean b);
}

public final class Character implements Comparable<Character> {
    public char charValue();
    public int compareTo(Character other);
    public static boolean isDigit(char ch);
    public static boolean isLetter(char ch);
}

public final class Math {
    public static final double PI = 3.141592653589793;
    public static int max(int a, int b);
    public static int min(int a, int b);
    public static int abs(int a);
    public static double sqrt(double a);
    public static double random();
}

public final class System {
    public static final java.io.PrintStream out = null;
    public static final java.io.PrintStream err = null;
    public static long currentTimeMillis();
    public static String getProperty(String key);
}

public class Thread implements Runnable {
    public Thread() {}
    public Thread(Runnable target) {}
    public void run();
    public void start();
    public static void sleep(long millis) throws InterruptedException;
}

public class Throwable {
    public Throwable() {}
    public Throwable(String message) {}
    public Throwable(String message, Throwable cause) {}
    public String getMessage();
    public Throwable getCause();
    public void printStackTrace();
}

public class Exception extends Throwable {
    public Exception() {}
    public Exception(String message) {}
    public Exception(String message, Throwable cause) {}
}

public class Error extends Throwable {
    public Error() {}
}

public class RuntimeException extends Exception {
    public RuntimeException() {}
    public RuntimeException(String message) {}
    public RuntimeException(String message, Throwable cause) {}
}

public class IllegalArgumentException extends RuntimeException {
    public IllegalArgumentException() {}
    public IllegalArgumentException(String message) {}
}

public class IllegalStateException extends RuntimeException {
    public IllegalStateException() {}
    public IllegalStateException(String message) {}
}

public class NumberFormatException extends IllegalArgumentException {
    public NumberFormatException() {}
}

public class NullPointerException extends RuntimeException {
    public NullPointerException() {}
}

public class UnsupportedOperationException extends RuntimeException {
    public UnsupportedOperationException() {}
}

public class InterruptedException extends Exception {
    public InterruptedException() {}
}

public class CloneNotSupportedException extends Exception {
    public CloneNotSupportedException() {}
}

public class ReflectiveOperationException extends Exception {
    public ReflectiveOperationException() {}
}

public class ClassNotFoundException extends ReflectiveOperationException {
    public ClassNotFoundException() {}
}
"#;

pub const JAVA_UTIL: &str = r#"
package java.util;

import java.util.function.Consumer;
import java.util.function.Function;
import java.util.function.Predicate;
import java.util.function.Supplier;

public interface Iterator<E> {
    boolean hasNext();
    E next();
}

public interface Collection<E> extends Iterable<E> {
    int size();
    boolean isEmpty();
    boolean contains(Object o);
    boolean add(E e);
    boolean remove(Object o);
    void clear();
    default boolean removeIf(Predicate<? super E> filter);
}

public interface List<E> extends Collection<E> {
    E get(int index);
    E set(int index, E element);
    void add(int index, E element);
    int indexOf(Object o);
    default void sort(Comparator<? super E> c);
    static <E> List<E> of();
    static <E> List<E> of(E e1);
    static <E> List<E> of(E e1, E e2);
}

public interface Set<E> extends Collection<E> {
}

public interface Queue<E> extends Collection<E> {
    E poll();
    E peek();
}

public interface Map<K, V> {
    interface Entry<K, V> {
        K getKey();
        V getValue();
    }
    V get(Object key);
    V put(K key, V value);
    boolean containsKey(Object key);
    int size();
    Set<K> keySet();
    Collection<V> values();
    Set<Map.Entry<K, V>> entrySet();
    default V getOrDefault(Object key, V defaultValue);
    default V computeIfAbsent(K key, Function<? super K, ? extends V> mappingFunction);
}

public class ArrayList<E> implements List<E> {
    public ArrayList() {}
    public ArrayList(int initialCapacity) {}
    public ArrayList(Collection<? extends E> c) {}
}

public class LinkedList<E> implements List<E>, Queue<E> {
    public LinkedList() {}
}

public class HashSet<E> implements Set<E> {
    public HashSet() {}
}

public class HashMap<K, V> implements Map<K, V> {
    public HashMap() {}
    public HashMap(int initialCapacity) {}
}

public class TreeMap<K, V> implements Map<K, V> {
    public TreeMap() {}
}

@FunctionalInterface
public interface Comparator<T> {
    int compare(T o1, T o2);
    boolean equals(Object obj);
    default Comparator<T> reversed();
    static <T> Comparator<T> naturalOrder();
}

public class Collections {
    public static <T> List<T> emptyList();
    public static <T> List<T> singletonList(T o);
    public static <T> void sort(List<T> list, Comparator<? super T> c);
    public static <T> List<T> unmodifiableList(List<? extends T> list);
}

public class Arrays {
    public static <T> List<T> asList(T... a);
    public static String toString(Object[] a);
    public static void sort(int[] a);
}

public final class Objects {
    public static boolean equals(Object a, Object b);
    public static int hash(Object... values);
    public static <T> T requireNonNull(T obj);
    public static boolean isNull(Object obj);
}

public final class Optional<T> {
    public static <T> Optional<T> of(T value);
    public static <T> Optional<T> empty();
    public T get();
    public boolean isPresent();
    public T orElse(T other);
    public T orElseGet(Supplier<? extends T> supplier);
    public <U> Optional<U> map(Function<? super T, ? extends U> mapper);
    public void ifPresent(Consumer<? super T> action);
}

public class Random {
    public Random() {}
    public int nextInt(int bound);
}
"#;

pub const JAVA_UTIL_FUNCTION: &str = r#"
package java.util.function;

@FunctionalInterface
public interface Function<T, R> {
    R apply(T t);
}

@FunctionalInterface
public interface BiFunction<T, U, R> {
    R apply(T t, U u);
}

@FunctionalInterface
public interface UnaryOperator<T> extends Function<T, T> {
}

@FunctionalInterface
public interface BinaryOperator<T> extends BiFunction<T, T, T> {
}

@FunctionalInterface
public interface Supplier<T> {
    T get();
}

@FunctionalInterface
public interface Consumer<T> {
    void accept(T t);
}

@FunctionalInterface
public interface BiConsumer<T, U> {
    void accept(T t, U u);
}

@FunctionalInterface
public interface Predicate<T> {
    boolean test(T t);
}

@FunctionalInterface
public interface BiPredicate<T, U> {
    boolean test(T t, U u);
}

@FunctionalInterface
public interface IntFunction<R> {
    R apply(int value);
}

@FunctionalInterface
public interface IntBinaryOperator {
    int applyAsInt(int left, int right);
}

@FunctionalInterface
public interface IntUnaryOperator {
    int applyAsInt(int operand);
}

@FunctionalInterface
public interface ToIntFunction<T> {
    int applyAsInt(T value);
}

@FunctionalInterface
public interface IntSupplier {
    int getAsInt();
}

@FunctionalInterface
public interface IntPredicate {
    boolean test(int value);
}
"#;

pub const JAVA_UTIL_CONCURRENT: &str = r#"
package java.util.concurrent;

@FunctionalInterface
public interface Callable<V> {
    V call() throws Exception;
}

public class ExecutionException extends Exception {
    public ExecutionException() {}
}

public class TimeoutException extends Exception {
    public TimeoutException() {}
}
"#;

pub const JAVA_IO: &str = r#"
package java.io;

public interface Serializable {
}

public interface Closeable extends AutoCloseable {
    void close() throws IOException;
}

public class IOException extends Exception {
    public IOException() {}
    public IOException(String message) {}
}

public class FileNotFoundException extends IOException {
    public FileNotFoundException() {}
    public FileNotFoundException(String message) {}
}

public class EOFException extends IOException {
    public EOFException() {}
}

public class UncheckedIOException extends RuntimeException {
    public UncheckedIOException(String message, IOException cause) {}
    public UncheckedIOException(IOException cause) {}
}

public class PrintStream {
    public void println();
    public void println(String x);
    public void println(int x);
    public void println(Object x);
    public void print(String s);
}

public abstract class InputStream implements Closeable {
    public abstract int read() throws IOException;
    public void close() throws IOException;
}

public class FileInputStream extends InputStream {
    public FileInputStream(String name) throws FileNotFoundException {}
    public int read() throws IOException;
}

public abstract class Reader implements Closeable {
    public int read() throws IOException;
    public void close() throws IOException;
}

public class StringReader extends Reader {
    public StringReader(String s) {}
}

public class FileReader extends Reader {
    public FileReader(String fileName) throws FileNotFoundException {}
}

public class BufferedReader extends Reader {
    public BufferedReader(Reader in) {}
    public String readLine() throws IOException;
}
"#;

/// Every stub compilation unit, in resolution order.
pub const STUBS: &[&str] = &[
    JAVA_LANG,
    JAVA_UTIL,
    JAVA_UTIL_FUNCTION,
    JAVA_UTIL_CONCURRENT,
    JAVA_IO,
];
